//! Bug lifecycle operator - keeps Bugzilla bugs moving through triage.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bugzilla::{BugzillaClient, CachedClient, RestClient};
use clap::{Parser, Subcommand, ValueEnum};
use config::OperatorConfig;
use notify::{ChatClient, DisabledChat, SlackClient, SlackSettings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lifecycle::{
    run_controllers, Controller, IncomingReporter, MetaComponentController, StaleController,
    TracingRecorder,
};

/// Bug lifecycle operator.
#[derive(Parser)]
#[command(name = "bug-lifecycle-operator")]
#[command(about = "Mark stale bugs, reassign meta-component bugs and report incoming bugs")]
#[command(version)]
struct Cli {
    /// Operator configuration file.
    #[arg(
        long,
        env = "OPERATOR_CONFIG",
        default_value = "/etc/bug-lifecycle-operator/config.yaml"
    )]
    config: PathBuf,

    /// Bugzilla API key (or set `BUGZILLA_API_KEY` env var).
    #[arg(long, env = "BUGZILLA_API_KEY", default_value = "", hide_env_values = true)]
    bugzilla_api_key: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every controller on its resync interval until interrupted.
    Run,

    /// Run a single pass of one controller.
    Once {
        #[arg(value_enum)]
        controller: ControllerKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ControllerKind {
    Stale,
    MetaComponent,
    Incoming,
}

struct Controllers {
    stale: Arc<StaleController>,
    meta_component: Arc<MetaComponentController>,
    incoming: Arc<IncomingReporter>,
}

impl Controllers {
    fn build(
        client: &Arc<dyn BugzillaClient>,
        chat: &Arc<dyn ChatClient>,
        config: &Arc<OperatorConfig>,
    ) -> Self {
        Self {
            stale: Arc::new(StaleController::new(
                client.clone(),
                chat.clone(),
                Arc::new(TracingRecorder::new("StaleController")),
                config.clone(),
            )),
            meta_component: Arc::new(MetaComponentController::new(
                client.clone(),
                chat.clone(),
                Arc::new(TracingRecorder::new("MetaComponentController")),
                config.clone(),
            )),
            incoming: Arc::new(IncomingReporter::new(
                client.clone(),
                chat.clone(),
                Arc::new(TracingRecorder::new("IncomingReporter")),
                config.clone(),
            )),
        }
    }

    fn get(&self, kind: ControllerKind) -> Arc<dyn Controller> {
        match kind {
            ControllerKind::Stale => self.stale.clone(),
            ControllerKind::MetaComponent => self.meta_component.clone(),
            ControllerKind::Incoming => self.incoming.clone(),
        }
    }

    fn all(&self) -> Vec<Arc<dyn Controller>> {
        vec![
            self.stale.clone(),
            self.meta_component.clone(),
            self.incoming.clone(),
        ]
    }
}

fn chat_client(config: &OperatorConfig) -> Arc<dyn ChatClient> {
    if notify::disabled_by_env() {
        info!("Notifications disabled via NOTIFY_DISABLED");
        return Arc::new(DisabledChat);
    }
    let slack = SlackClient::from_env(SlackSettings {
        admin_channel: config.slack.admin_channel.clone(),
        status_channel: config.slack.status_channel.clone(),
        debug: config.slack.debug,
    });
    if slack.enabled() {
        Arc::new(slack)
    } else {
        warn!("SLACK_BOT_TOKEN not set, notifications will be dropped");
        Arc::new(DisabledChat)
    }
}

/// Cancel `token` on Ctrl-C so running passes stop between bugs.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = OperatorConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let config = Arc::new(config);

    if cli.bugzilla_api_key.trim().is_empty() {
        bail!("A Bugzilla API key is required (--bugzilla-api-key or BUGZILLA_API_KEY)");
    }
    let rest = RestClient::new(&config.bugzilla_url, cli.bugzilla_api_key.trim())
        .context("Failed to create Bugzilla client")?;
    let client: Arc<dyn BugzillaClient> = Arc::new(CachedClient::new(rest));
    let chat = chat_client(&config);
    let controllers = Controllers::build(&client, &chat, &config);

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match cli.command {
        Commands::Run => {
            info!(
                bugzilla = %config.bugzilla_url,
                components = config.components.len(),
                chat = chat.name(),
                "Starting bug lifecycle operator"
            );
            run_controllers(controllers.all(), cancel).await;
        }
        Commands::Once { controller } => {
            let controller = controllers.get(controller);
            controller
                .sync(&cancel)
                .await
                .with_context(|| format!("{} pass failed", controller.name()))?;
            info!(controller = controller.name(), "Pass completed");
        }
    }

    Ok(())
}

//! Comment noise filtering.
//!
//! A comment containing any of the filter's keywords does not count as
//! activity on the bug.

/// Phrases left by sprint planning and triage tooling.
pub const PROCESS_KEYWORDS: &[&str] = &[
    "PM Score",
    "UpcomingSprint",
    "This bug will be evaluated during the next sprint and prioritized appropriately.",
    "I am working on other high priority items. I will get to this bug next sprint.",
    "This bug will be evaluated next sprint.",
    "bug is actively worked on",
];

/// Phrases left by the operator itself.
pub const BOT_COMMENT_KEYWORDS: &[&str] = &[
    "we're marking this bug as \"LifecycleStale\"",
    "The LifecycleStale keyword was removed because",
];

/// Whether `text` contains any of `keywords` (case-sensitive).
pub fn is_noise<K: AsRef<str>>(text: &str, keywords: &[K]) -> bool {
    keywords.iter().any(|keyword| {
        let keyword: &str = keyword.as_ref();
        !keyword.is_empty() && text.contains(keyword)
    })
}

/// Substring matcher for noise comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseFilter {
    keywords: Vec<String>,
}

impl NoiseFilter {
    /// Empty keywords are dropped; they would match every comment.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|keyword: &String| !keyword.is_empty())
                .collect(),
        }
    }

    /// Filter for the stale rule: the configured stale comment, the bot's
    /// own phrases and process noise.
    pub fn significant(stale_comment: &str) -> Self {
        Self::new(
            std::iter::once(stale_comment)
                .chain(BOT_COMMENT_KEYWORDS.iter().copied())
                .chain(PROCESS_KEYWORDS.iter().copied()),
        )
    }

    /// Filter that only ignores process noise, so bot comments count.
    pub fn process_only() -> Self {
        Self::new(PROCESS_KEYWORDS.iter().copied())
    }

    /// First keyword contained in `text`.
    pub fn matching(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| text.contains(keyword))
    }

    pub fn is_noise(&self, text: &str) -> bool {
        is_noise(text, &self.keywords)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

//! Search query builder.

use serde::{Deserialize, Serialize};

/// One custom search criterion (`f<N>`/`o<N>`/`v<N>`/`n<N>` parameters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedQuery {
    /// Field to match, e.g. `status_whiteboard`.
    pub field: String,
    /// Operator, e.g. `substring`, `notsubstring`, `notequals`.
    pub op: String,
    pub value: String,
    /// Negate the whole criterion.
    #[serde(default)]
    pub negate: bool,
}

impl AdvancedQuery {
    #[must_use]
    pub fn new(field: &str, op: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            op: op.to_string(),
            value: value.to_string(),
            negate: false,
        }
    }

    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

/// A bug search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub classification: Vec<String>,
    pub product: Vec<String>,
    pub status: Vec<String>,
    pub component: Vec<String>,
    pub advanced: Vec<AdvancedQuery>,
    /// Restrict returned fields; empty means the server default set.
    pub include_fields: Vec<String>,
}

impl Query {
    /// Render the query as URL parameters for `GET /rest/bug`.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let repeated = [
            ("classification", &self.classification),
            ("product", &self.product),
            ("bug_status", &self.status),
            ("component", &self.component),
        ];
        for (key, values) in repeated {
            for value in values {
                params.push((key.to_string(), value.clone()));
            }
        }

        for (index, criterion) in self.advanced.iter().enumerate() {
            let n = index + 1;
            params.push((format!("f{n}"), criterion.field.clone()));
            params.push((format!("o{n}"), criterion.op.clone()));
            params.push((format!("v{n}"), criterion.value.clone()));
            if criterion.negate {
                params.push((format!("n{n}"), "1".to_string()));
            }
        }

        if !self.include_fields.is_empty() {
            params.push(("include_fields".to_string(), self.include_fields.join(",")));
        }

        params
    }
}

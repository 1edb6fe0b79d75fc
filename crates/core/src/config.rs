//! Compare configuration
//!
//! Every field has a default, so a config document only needs to name what it changes.

use crate::diff::DiffConfig;
use crate::error::ConfigError;
use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};

/// Upper bound for search context, keeps hit snippets readable
pub const MAX_CONTEXT_CHARS: usize = 1_000;

/// Configuration for a compare session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub diff: DiffConfig,
    pub search: SearchConfig,
}

impl CompareConfig {
    /// Parse and validate a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the diff cell budget
    pub fn with_cell_budget(mut self, cell_budget: usize) -> Self {
        self.diff.cell_budget = cell_budget;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diff.cell_budget == 0 {
            return Err(ConfigError::ZeroCellBudget);
        }

        if self.search.context_chars > MAX_CONTEXT_CHARS {
            return Err(ConfigError::SearchContextTooLarge {
                value: self.search.context_chars,
                max: MAX_CONTEXT_CHARS,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DEFAULT_CELL_BUDGET;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CompareConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CompareConfig::default());
        assert_eq!(config.diff.cell_budget, DEFAULT_CELL_BUDGET);
        assert_eq!(config.search.context_chars, 40);
        assert!(!config.search.case_sensitive);
    }

    #[test]
    fn test_partial_document_overrides_named_fields() {
        let json = r#"{ "diff": { "cell_budget": 1000 }, "search": { "case_sensitive": true } }"#;
        let config = CompareConfig::from_json_str(json).unwrap();

        assert_eq!(config.diff.cell_budget, 1000);
        assert!(config.search.case_sensitive);
        assert_eq!(config.search.context_chars, 40);
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let result = CompareConfig::from_json_str(r#"{ "diff": { "cell_budget": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::ZeroCellBudget)));

        assert!(CompareConfig::default().with_cell_budget(0).validate().is_err());
    }

    #[test]
    fn test_oversized_context_is_rejected() {
        let result = CompareConfig::from_json_str(r#"{ "search": { "context_chars": 5000 } }"#);
        assert!(matches!(result, Err(ConfigError::SearchContextTooLarge { value: 5000, .. })));
    }

    #[test]
    fn test_malformed_document_reports_parse_error() {
        let result = CompareConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = CompareConfig::from_json_str(r#"{ "diff": { "cell_budget": -1 } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

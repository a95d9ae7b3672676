//! Recent failures and last user action, kept for clients to inspect

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Oldest errors are dropped past this many
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Recent errors, prefixed with the component that raised them
    pub errors: Vec<String>,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        if self.errors.len() > MAX_ERRORS {
            let excess = self.errors.len() - MAX_ERRORS;
            self.errors.drain(..excess);
        }
    }

    /// Clear errors mentioning `component`
    pub fn clear_errors_for(&mut self, component: &str) {
        let initial_count = self.errors.len();
        let component = component.to_lowercase();
        self.errors.retain(|error| !error.to_lowercase().contains(&component));

        if self.errors.len() != initial_count {
            tracing::info!("Cleared {} errors for component: {}", initial_count - self.errors.len(), component);
        }
    }

    pub fn record_action(&mut self, action: &str) {
        self.last_action = Some(action.to_string());
        self.last_action_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_bounded() {
        let mut diagnostics = Diagnostics::new();
        for i in 0..25 {
            diagnostics.add_error(format!("ledger error {}", i));
        }
        assert_eq!(diagnostics.errors.len(), MAX_ERRORS);
        assert_eq!(diagnostics.errors[0], "ledger error 5");
    }

    #[test]
    fn test_clear_errors_for_component() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("Ledger add failed: denied".to_string());
        diagnostics.add_error("Window pin failed".to_string());
        diagnostics.clear_errors_for("ledger");
        assert_eq!(diagnostics.errors, vec!["Window pin failed".to_string()]);
    }

    #[test]
    fn test_record_action() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_action("start");
        assert_eq!(diagnostics.last_action.as_deref(), Some("start"));
        assert!(diagnostics.last_action_time.is_some());
    }
}

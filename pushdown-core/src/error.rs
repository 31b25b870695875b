//! Core error types.

use std::fmt;
use thiserror::Error;

/// Which of the two required states a definition is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRole {
    Start,
    End,
}

impl fmt::Display for StateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateRole::Start => f.write_str("start"),
            StateRole::End => f.write_str("end"),
        }
    }
}

/// Errors from definition validation and the execution engine.
///
/// Rejection of an input is not an error; see [`crate::Verdict`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required {role} state")]
    MissingRequiredState { role: StateRole },

    #[error("invalid machine definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("invalid state: '{state}'; possible states: {known}")]
    InvalidState { state: String, known: String },

    #[error("invalid transition rule number: {rule} (expected 1..={max})")]
    InvalidRuleNumber { rule: u32, max: u32 },

    #[error("invalid grammar rule label: '{label}'")]
    InvalidRuleLabel { label: String },

    #[error("no run in progress")]
    NotRunning,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trace output error: {0}")]
    Trace(#[from] std::io::Error),
}

impl CoreError {
    /// Returns whether this error is a contract violation by the caller,
    /// as opposed to a failure of an external collaborator.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, CoreError::Json(_) | CoreError::Trace(_))
    }

    /// Returns a stable error code for display and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::MissingRequiredState { .. } => "MISSING_REQUIRED_STATE",
            CoreError::InvalidDefinition { .. } => "INVALID_DEFINITION",
            CoreError::InvalidState { .. } => "INVALID_STATE",
            CoreError::InvalidRuleNumber { .. } => "INVALID_RULE_NUMBER",
            CoreError::InvalidRuleLabel { .. } => "INVALID_RULE_LABEL",
            CoreError::NotRunning => "NOT_RUNNING",
            CoreError::Json(_) => "BAD_DEFINITION_JSON",
            CoreError::Trace(_) => "TRACE_IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    fn all_variants() -> Vec<CoreError> {
        vec![
            CoreError::MissingRequiredState {
                role: StateRole::Start,
            },
            CoreError::InvalidDefinition {
                reason: "empty".to_string(),
            },
            CoreError::InvalidState {
                state: "x".to_string(),
                known: "p, q".to_string(),
            },
            CoreError::InvalidRuleNumber { rule: 9, max: 8 },
            CoreError::InvalidRuleLabel {
                label: "S -> x".to_string(),
            },
            CoreError::NotRunning,
            CoreError::Json(serde_json::from_str::<u32>("nope").unwrap_err()),
            CoreError::Trace(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
        ]
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes: Vec<_> = all_variants().iter().map(CoreError::error_code).collect();
        let unique: HashSet<_> = codes.iter().collect();

        assert_eq!(unique.len(), codes.len());
        assert!(codes
            .iter()
            .all(|c| c.chars().all(|ch| ch.is_ascii_uppercase() || ch == '_')));
        assert_eq!(CoreError::NotRunning.error_code(), "NOT_RUNNING");
    }

    #[test]
    fn test_contract_violation_classification() {
        let violations: Vec<_> = all_variants()
            .iter()
            .map(|e| (e.error_code(), e.is_contract_violation()))
            .collect();

        assert_eq!(
            violations,
            vec![
                ("MISSING_REQUIRED_STATE", true),
                ("INVALID_DEFINITION", true),
                ("INVALID_STATE", true),
                ("INVALID_RULE_NUMBER", true),
                ("INVALID_RULE_LABEL", true),
                ("NOT_RUNNING", true),
                ("BAD_DEFINITION_JSON", false),
                ("TRACE_IO_ERROR", false),
            ]
        );
    }

    #[test]
    fn test_display() {
        let err = CoreError::MissingRequiredState {
            role: StateRole::End,
        };
        assert_eq!(err.to_string(), "missing required end state");
        assert_eq!(
            CoreError::InvalidRuleNumber { rule: 9, max: 8 }.to_string(),
            "invalid transition rule number: 9 (expected 1..=8)"
        );
    }
}

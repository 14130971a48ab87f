use thiserror::Error;

/// A violated business rule.
///
/// `Invalid` is a malformed input; every other variant is a request that is
/// well-formed but conflicts with the current state of the records.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RuleError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },
    #[error("period {periodo} is closed")]
    PeriodClosed { periodo: String },
    #[error("{0}")]
    Precondition(String),
}

impl RuleError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Whether the error describes bad input rather than a state conflict.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

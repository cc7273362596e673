//! Error types surfaced by the economy core.
use thiserror::Error;

use crate::collapse::VitalState;
use crate::rescue::RescueKind;

/// Errors raised by ledger mutations, committed actions, and rescue handling.
///
/// Every variant is recoverable: the ledger is left exactly as it was before
/// the failing call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconomyError {
    #[error("{field} must be a finite, non-negative amount (got {value})")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("insufficient stamina: action needs {required:.2}, only {available:.2} available")]
    InsufficientResource { required: f64, available: f64 },
    #[error("action blocked while player is {state}")]
    AlreadyCollapsed { state: VitalState },
    #[error("{kind} rescue already used {cap} time(s) today")]
    RescueCapReached { kind: RescueKind, cap: u32 },
    #[error("{kind} rescue does not apply to the current player state")]
    RescueNotApplicable { kind: RescueKind },
    #[error("no pending rescue for token {token}")]
    UnknownRescueToken { token: u64 },
}

/// Errors raised when economy configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value:.2})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("expansion tier {index} must start above the previous tier and cost at least as much")]
    TierOrder { index: usize },
    #[error("failed to parse economy config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = EconomyError::InvalidAmount {
            field: "hygiene",
            value: -2.0,
        };
        assert_eq!(
            err.to_string(),
            "hygiene must be a finite, non-negative amount (got -2)"
        );

        let err = EconomyError::AlreadyCollapsed {
            state: VitalState::Ghost,
        };
        assert_eq!(err.to_string(), "action blocked while player is ghost");

        let err = EconomyError::RescueCapReached {
            kind: RescueKind::GhostRevival,
            cap: 1,
        };
        assert!(err.to_string().contains("ghost-revival"));
    }

    #[test]
    fn config_parse_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

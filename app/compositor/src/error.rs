//! Error types for Lattice.
//!
//! The compositor core never propagates typed errors: tree, transaction, and
//! seat operations report failure through `bool`/`Option` results and log at
//! the point of failure. Typed errors only exist at the outer surfaces
//! (configuration loading, the event loop channel, the replay CLI).

use thiserror::Error;

use crate::actor::ActorError;
use crate::config::ConfigError;

/// Errors that can occur while running the Lattice binary.
#[derive(Debug, Error)]
pub enum LatticeError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A replay script could not be parsed.
    #[error("Script error: {0}")]
    Script(#[from] serde_json::Error),
    /// The compositor event loop could not be reached.
    #[error("Event loop error: {0}")]
    Actor(#[from] ActorError),
}

/// Logs an invariant violation and evaluates to whether the condition held.
///
/// Invariant violations indicate a pre-existing bug rather than an expected
/// runtime condition. Callers return early when this yields `false`.
#[macro_export]
macro_rules! soft_assert {
    ($cond:expr, $($arg:tt)+) => {{
        let ok: bool = $cond;
        if !ok {
            tracing::error!($($arg)+);
        }
        ok
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = LatticeError::InvalidArguments("script path is required".to_string());
        assert_eq!(err.to_string(), "script path is required");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LatticeError = io_err.into();
        assert!(matches!(err, LatticeError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_script_error_from_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LatticeError = parse_err.into();
        assert!(err.to_string().starts_with("Script error"));
    }

    #[test]
    fn test_actor_error_display() {
        let err: LatticeError = ActorError::SendFailed.into();
        assert!(err.to_string().contains("channel closed"));
    }

    #[test]
    fn test_soft_assert_passes_condition_through() {
        assert!(soft_assert!(1 + 1 == 2, "arithmetic broke"));
        assert!(!soft_assert!(1 + 1 == 3, "expected failure {}", 3));
    }
}

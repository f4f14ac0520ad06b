//! Error types for `invisible-cost`
//!
//! One error enum per subsystem, aggregated by [`InvisibleCostError`]
//! which also owns the mapping to process exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Render bridge error (connection failed, protocol error)
    pub const BRIDGE_ERROR: i32 = 4;

    /// Phase catalog error (empty or malformed timeline)
    pub const PHASE_ERROR: i32 = 5;

    /// Rejected user input (negative values, unknown category)
    pub const INPUT_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for exit code mapping.
#[derive(Debug, Error)]
pub enum InvisibleCostError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// User input rejected at the submission boundary
    #[error(transparent)]
    Input(#[from] InputError),

    /// Phase catalog error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Render bridge error
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl InvisibleCostError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Input(_) => ExitCode::INPUT_ERROR,
            Self::Phase(_) => ExitCode::PHASE_ERROR,
            Self::Bridge(_) => ExitCode::BRIDGE_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(.errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file is empty
    #[error("configuration file is empty: {path}")]
    Empty {
        /// Path to the empty file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "phases[2].cues[0].threshold")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Informational, does not prevent loading
    Warning,
}

// ============================================================================
// Input Errors
// ============================================================================

/// User input rejected before it reaches the cost model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Category string is not one of the recognised categories
    #[error("unknown category '{given}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownCategory {
        /// The string that was supplied
        given: String,
        /// Closest recognised category, when one is close enough
        suggestion: Option<String>,
    },

    /// A numeric parameter is negative, NaN or infinite
    #[error("parameter '{field}' must be a finite non-negative number, got {value}")]
    InvalidNumber {
        /// Parameter name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A parameter the selected category needs was not supplied
    #[error("category '{category}' requires parameter '{field}'")]
    MissingParameter {
        /// Category slug
        category: &'static str,
        /// Parameter name
        field: &'static str,
    },

    /// Overhead multiplier below 1.0 would produce negative indirect cost
    #[error("overhead multiplier must be at least 1.0, got {0}")]
    OverheadBelowOne(f64),

    /// Savings reduction fraction outside (0, 1]
    #[error("reduction fraction must be in (0, 1], got {0}")]
    InvalidReduction(f64),

    /// The benchmark table has no entry for the category
    #[error("no benchmark data for category '{0}'")]
    NoBenchmark(&'static str),

    /// Unrecognised automation level or channel name
    #[error("unknown {kind} '{given}'")]
    UnknownOption {
        /// Which enumeration was being parsed
        kind: &'static str,
        /// The string that was supplied
        given: String,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Phase Errors
// ============================================================================

/// Phase catalog construction errors.
///
/// The sequencer itself never fails; these only arise while building a
/// catalog from configuration.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// A catalog needs at least one phase between `waiting` and `complete`
    #[error("phase catalog has no active phases")]
    EmptyCatalog,

    /// Two phases share a name
    #[error("duplicate phase name: {0}")]
    DuplicateName(String),

    /// A phase uses one of the reserved boundary names
    #[error("phase name '{0}' is reserved")]
    ReservedName(String),

    /// Duration is negative or not finite
    #[error("phase '{name}' has invalid duration {duration}")]
    InvalidDuration {
        /// Phase name
        name: String,
        /// Offending duration in seconds
        duration: f64,
    },

    /// Trigger threshold outside [0, 1]
    #[error("trigger '{key}' in phase '{phase}' has threshold {threshold} outside [0, 1]")]
    InvalidThreshold {
        /// Phase name
        phase: String,
        /// Trigger key
        key: String,
        /// Offending threshold
        threshold: f64,
    },

    /// Two triggers of one phase share a key
    #[error("duplicate trigger key '{key}' in phase '{phase}'")]
    DuplicateTriggerKey {
        /// Phase name
        phase: String,
        /// Repeated key
        key: String,
    },

    /// Referenced phase does not exist
    #[error("phase not found: {0}")]
    NotFound(String),
}

// ============================================================================
// Bridge Errors
// ============================================================================

/// Remote-control bridge errors.
///
/// These never reach sequencer state: the bridge logs and absorbs them.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O error on the socket
    #[error("bridge I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to establish connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connect did not complete in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// Buffered inbound message exceeds size limit
    #[error("message too large: {size} bytes (limit: {limit})")]
    MessageTooLarge {
        /// Buffered size in bytes
        size: usize,
        /// Configured size limit in bytes
        limit: usize,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, InvisibleCostError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::BRIDGE_ERROR, 4);
        assert_eq!(ExitCode::PHASE_ERROR, 5);
        assert_eq!(ExitCode::INPUT_ERROR, 6);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_exit_code_mapping() {
        let cases: Vec<(InvisibleCostError, i32)> = vec![
            (
                ConfigError::MissingFile {
                    path: PathBuf::from("/x"),
                }
                .into(),
                ExitCode::CONFIG_ERROR,
            ),
            (
                InputError::OverheadBelowOne(0.5).into(),
                ExitCode::INPUT_ERROR,
            ),
            (PhaseError::EmptyCatalog.into(), ExitCode::PHASE_ERROR),
            (
                BridgeError::ConnectionFailed("x".into()).into(),
                ExitCode::BRIDGE_ERROR,
            ),
            (
                InvisibleCostError::Usage("x".into()),
                ExitCode::USAGE_ERROR,
            ),
            (
                std::io::Error::new(std::io::ErrorKind::NotFound, "x").into(),
                ExitCode::IO_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "Wrong exit code for {err}");
        }
    }

    #[test]
    fn test_unknown_category_suggestion_display() {
        let err = InputError::UnknownCategory {
            given: "ticket-procesing".into(),
            suggestion: Some("ticket-processing".into()),
        };
        assert_eq!(
            err.to_string(),
            "unknown category 'ticket-procesing' (did you mean 'ticket-processing'?)"
        );

        let err = InputError::UnknownCategory {
            given: "zzz".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown category 'zzz'");
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "phases[0].cues[1].threshold".to_string(),
            message: "threshold outside [0, 1]".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: threshold outside [0, 1] at phases[0].cues[1].threshold"
        );
    }

    #[test]
    fn test_validation_error_lists_issues() {
        let err = ConfigError::ValidationError {
            path: "experience.yaml".into(),
            errors: vec![ValidationIssue {
                path: "experience.tick_hz".into(),
                message: "must be positive".into(),
                severity: Severity::Error,
            }],
        };
        let text = err.to_string();
        assert!(text.contains("experience.yaml"));
        assert!(text.contains("must be positive"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("config.yaml"),
            line: Some(42),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("config.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}

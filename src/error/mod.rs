//! Error types for server-status.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **SourceUnavailable**: a single metric or service probe failed. Recorded
//!   inline in the report as "unavailable".
//! - **LedgerUnavailable**: the token ledger could not be read. The cost
//!   summary degrades to zero totals and a flag.
//! - **PricingGap**: a (provider, model) pair has no price entry. Tokens are
//!   counted, cost is zero, the gap is listed.
//! - **DeliveryFailure**: the outbox write failed. The only category that
//!   aborts the invocation.
//! - **Configuration** and **Internal** cover everything around the pipeline.
//!
//! Each error has a stable error code (e.g., `SRV-D001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A metric or service probe could not be read.
    SourceUnavailable,
    /// The usage ledger could not be read.
    LedgerUnavailable,
    /// Usage for a model without a price entry.
    PricingGap,
    /// The report could not be handed to the outbox.
    DeliveryFailure,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "Source unavailable",
            Self::LedgerUnavailable => "Ledger unavailable",
            Self::PricingGap => "Pricing unavailable",
            Self::DeliveryFailure => "Delivery failure",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "S",
            Self::LedgerUnavailable => "L",
            Self::PricingGap => "P",
            Self::DeliveryFailure => "D",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }

    /// Whether failures in this category are absorbed into the report
    /// instead of failing the run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable | Self::LedgerUnavailable | Self::PricingGap
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Report produced (individual metrics may still be unavailable)
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid or unreadable configuration
    ConfigError = 2,
    /// Report produced but could not be queued
    DeliveryFailed = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for server-status operations.
#[derive(Error, Debug)]
pub enum StatusError {
    // ==========================================================================
    // Probe errors (Category: SourceUnavailable)
    // ==========================================================================
    /// A metric source could not be read.
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// An external command exceeded its timeout.
    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// An external command is not installed.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A probe returned output we could not interpret.
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// HTTP failure talking to a local service.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Ledger errors (Category: LedgerUnavailable)
    // ==========================================================================
    /// The ledger file is missing, unreadable, or has the wrong schema.
    #[error("ledger unavailable at {path}: {reason}")]
    LedgerUnavailable { path: String, reason: String },

    // ==========================================================================
    // Delivery errors (Category: DeliveryFailure)
    // ==========================================================================
    /// Writing the report to the outbox failed.
    #[error("could not queue report in {path}: {reason}")]
    DeliveryFailed { path: String, reason: String },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid { key: String, message: String },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatusError {
    /// Shorthand for a probe failure.
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } | Self::Config(_) => {
                ExitCode::ConfigError
            }

            Self::DeliveryFailed { .. } => ExitCode::DeliveryFailed,

            Self::SourceUnavailable { .. }
            | Self::Timeout { .. }
            | Self::CommandNotFound(_)
            | Self::Parse { .. }
            | Self::Network(_)
            | Self::LedgerUnavailable { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceUnavailable { .. }
            | Self::Timeout { .. }
            | Self::CommandNotFound(_)
            | Self::Parse { .. }
            | Self::Network(_) => ErrorCategory::SourceUnavailable,

            Self::LedgerUnavailable { .. } => ErrorCategory::LedgerUnavailable,

            Self::DeliveryFailed { .. } => ErrorCategory::DeliveryFailure,

            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } | Self::Config(_) => {
                ErrorCategory::Configuration
            }

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SRV-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SRV-S001",
            Self::Timeout { .. } => "SRV-S002",
            Self::CommandNotFound(_) => "SRV-S003",
            Self::Parse { .. } => "SRV-S004",
            Self::Network(_) => "SRV-S005",

            Self::LedgerUnavailable { .. } => "SRV-L001",

            Self::DeliveryFailed { .. } => "SRV-D001",

            Self::ConfigParse { .. } => "SRV-C001",
            Self::ConfigInvalid { .. } => "SRV-C002",
            Self::Config(_) => "SRV-C099",

            Self::Io(_) => "SRV-X001",
            Self::Json(_) => "SRV-X002",
            Self::Other(_) => "SRV-X099",
        }
    }

    /// A one-line hint for the operator, when there is something to do.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigParse { path, .. } => Some(format!("Fix the TOML syntax in {path}")),
            Self::ConfigInvalid { key, .. } => {
                Some(format!("Check '{key}' with: server-status config show"))
            }
            Self::DeliveryFailed { path, .. } => Some(format!(
                "Check that {path} exists and is writable, or run with --no-deliver"
            )),
            Self::LedgerUnavailable { .. } => {
                Some("Set paths.ledger in the config file".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for server-status operations.
pub type Result<T> = std::result::Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_failure_is_the_only_hard_pipeline_failure() {
        let delivery = StatusError::DeliveryFailed {
            path: "/tmp/outbox".to_string(),
            reason: "read-only file system".to_string(),
        };
        assert_eq!(delivery.exit_code(), ExitCode::DeliveryFailed);
        assert!(!delivery.category().is_recoverable());

        let probe = StatusError::unavailable("disk", "df exited with 1");
        assert!(probe.category().is_recoverable());

        let ledger = StatusError::LedgerUnavailable {
            path: "token_usage.db".to_string(),
            reason: "no such table: model_calls".to_string(),
        };
        assert!(ledger.category().is_recoverable());
    }

    #[test]
    fn config_errors_map_to_config_exit_code() {
        let err = StatusError::ConfigInvalid {
            key: "thresholds.ram_warning_percent".to_string(),
            message: "must be below critical".to_string(),
        };
        assert_eq!(err.exit_code(), ExitCode::ConfigError);
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(i32::from(err.exit_code()), 2);
    }

    #[test]
    fn error_codes_carry_category_prefix() {
        let cases = [
            StatusError::unavailable("cpu", "boom"),
            StatusError::Timeout {
                program: "df".to_string(),
                seconds: 5,
            },
            StatusError::LedgerUnavailable {
                path: "x".to_string(),
                reason: "y".to_string(),
            },
            StatusError::DeliveryFailed {
                path: "x".to_string(),
                reason: "y".to_string(),
            },
            StatusError::Config("bad".to_string()),
        ];

        for err in &cases {
            let prefix = format!("SRV-{}", err.category().code_prefix());
            assert!(
                err.error_code().starts_with(&prefix),
                "{} should start with {prefix}",
                err.error_code()
            );
        }
    }

    #[test]
    fn source_unavailable_display() {
        let err = StatusError::unavailable("model daemon", "connection refused");
        assert_eq!(err.to_string(), "model daemon unavailable: connection refused");
    }

    #[test]
    fn wrapped_errors_are_internal() {
        let err: StatusError = anyhow::anyhow!("unexpected state").into();
        assert_eq!(err.error_code(), "SRV-X099");
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
        assert_eq!(err.to_string(), "unexpected state");
    }
}

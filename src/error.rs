//! Error types for ndfc-rest.
//!
//! Four error families flow through the crate: precondition errors (a
//! required value is missing before an operation runs), controller response
//! errors (the envelope came back but signalled failure), validation errors
//! (playbook configuration inconsistent with template rules), and timeout
//! errors (an asynchronous controller action did not settle in budget).
//! Lower layers raise typed errors; intermediate layers re-raise with
//! context; only the caller at the task boundary converts them into its own
//! reporting contract.

use crate::sender::Verb;
use thiserror::Error;

/// Result type alias for ndfc-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ndfc-rest.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// A required value was not set before an operation ran.
    #[error("{component}: '{parameter}' must be set before {operation}")]
    MissingParameter {
        /// Component raising the error
        component: &'static str,
        /// The missing parameter
        parameter: &'static str,
        /// The operation that was attempted
        operation: &'static str,
    },

    /// `commit()` was called before the request was configured.
    #[error("RestSend not configured: {0}")]
    NotConfigured(String),

    /// A request payload was present but not a JSON object.
    #[error("payload for {verb} {path} must be a JSON object")]
    InvalidPayload {
        /// Request verb
        verb: Verb,
        /// Request path
        path: String,
    },

    /// `save_settings()` called while a snapshot is already held.
    #[error("RestSend settings already saved; restore before saving again")]
    SettingsAlreadySaved,

    /// `restore_settings()` called with no snapshot to restore.
    #[error("no saved RestSend settings to restore")]
    NoSavedSettings,

    // ========================================================================
    // Controller Response Errors
    // ========================================================================
    /// The HTTP request itself failed (connection, TLS, decode).
    #[error("{verb} {path} failed: {message}")]
    Transport {
        /// Request verb
        verb: Verb,
        /// Request path
        path: String,
        /// Underlying failure
        message: String,
    },

    /// A mandatory envelope field was absent. The controller owns the
    /// envelope contract, so this is fatal rather than recoverable.
    #[error("controller response missing mandatory field '{field}': {response}")]
    MissingField {
        /// The absent field
        field: &'static str,
        /// The offending response, serialized
        response: String,
    },

    /// The verb string is not one of GET, POST, PUT, DELETE.
    #[error("invalid verb '{0}', expected one of GET, POST, PUT, DELETE")]
    InvalidVerb(String),

    /// The controller answered with a failure envelope.
    #[error("controller returned {return_code} for {verb} {path}: {message}")]
    ControllerResponse {
        /// Request verb
        verb: Verb,
        /// Request path
        path: String,
        /// Envelope RETURN_CODE
        return_code: i64,
        /// Envelope MESSAGE or ERROR detail
        message: String,
    },

    /// No row matched the requested switch in the controller state view.
    #[error("switch with {filter} '{key}' not found on the controller")]
    SwitchNotFound {
        /// Filter field used for the lookup
        filter: &'static str,
        /// Lookup key
        key: String,
    },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Unknown comparison operator in a template rule.
    #[error("unknown rule operator '{0}', expected one of ==, !=, <, <=, >, >=, in")]
    UnknownOperator(String),

    /// A template rule annotation could not be parsed.
    #[error("cannot parse rule '{rule}' for parameter '{parameter}': {message}")]
    InvalidRule {
        /// The parameter the rule belongs to
        parameter: String,
        /// The raw rule text
        rule: String,
        /// What went wrong
        message: String,
    },

    /// Playbook configuration inconsistent with template dependency rules.
    /// Collected exhaustively across all parameters before being raised.
    #[error("playbook config for fabric '{fabric}' is invalid: {report}")]
    Validation {
        /// Fabric the configuration targets
        fabric: String,
        /// Combined report of every failed (parameter, dependency) pair
        report: String,
    },

    // ========================================================================
    // Timeout Errors
    // ========================================================================
    /// An asynchronous controller action did not settle within budget.
    #[error(
        "timed out after {timeout_secs}s waiting for controller actions; \
         done: {done:?}, pending: {pending:?}"
    )]
    Timeout {
        /// Items that completed before the budget ran out
        done: Vec<String>,
        /// Items still in progress
        pending: Vec<String>,
        /// The exhausted budget in seconds
        timeout_secs: u64,
    },

    // ========================================================================
    // Configuration / Serialization Errors
    // ========================================================================
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Base URL or path could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a precondition error for a missing parameter.
    pub fn missing_parameter(
        component: &'static str,
        parameter: &'static str,
        operation: &'static str,
    ) -> Self {
        Self::MissingParameter {
            component,
            parameter,
            operation,
        }
    }

    /// Creates a controller response error from an envelope.
    pub fn controller_response(
        verb: Verb,
        path: impl Into<String>,
        return_code: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::ControllerResponse {
            verb,
            path: path.into(),
            return_code,
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation later could succeed.
    /// Precondition and contract violations never are.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::ControllerResponse { .. } | Error::Timeout { .. }
        )
    }
}

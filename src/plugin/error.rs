//! Error taxonomy shared by every plugin.
//!
//! Each [PluginError] variant maps to exactly one process exit code. External
//! schedulers branch on these integers to decide between retrying, giving up
//! and flagging a misconfiguration, so the table in [PluginError::exit_code]
//! must stay stable.

use std::io;

use derive_more::{Display, Error, From};

/// The verb finished without error.
pub const SUCCESS: i32 = 0;
/// Malformed command line invocation.
pub const USAGE: i32 = 1;
/// The plugin does not implement the requested verb.
pub const UNSUPPORTED_ACTION: i32 = 2;
/// A shelled-out subprocess failed.
pub const EXEC_FAILURE: i32 = 3;
/// Unclassified failure while running a verb.
pub const PLUGIN_FAILURE: i32 = 4;
/// Malformed or unserializable JSON.
pub const JSON_FAILURE: i32 = 10;
/// `retrieve` or `purge` invoked without `--key`.
pub const RESTORE_KEY_REQUIRED: i32 = 11;
/// A required endpoint key is absent.
pub const ENDPOINT_MISSING_KEY: i32 = 12;
/// An endpoint key holds a value of the wrong type.
pub const ENDPOINT_BAD_DATA: i32 = 13;

#[derive(Debug, Display, Error, From)]
/// Errors a plugin verb may end with.
pub enum PluginError {
    /// The command line could not be turned into a verb invocation.
    #[display("{_0}")]
    Usage(#[error(ignore)] String),

    /// The plugin does not support `action`.
    ///
    /// Plugins may leave `action` empty; the dispatcher fills in the verb
    /// that was attempted before reporting the error.
    #[display("The '{action}' action is not supported by this plugin")]
    UnsupportedAction { action: String },

    /// A subprocess could not be parsed, spawned or exited unacceptably.
    #[display("{_0}")]
    Exec(#[error(ignore)] String),

    /// Catch-all for plugin specific failures.
    #[display("{_0}")]
    Failure(#[error(ignore)] String),

    /// I/O failure while streaming payload data.
    #[from]
    #[display("{_0}")]
    Io(io::Error),

    /// The endpoint (or the plugin metadata) is not valid JSON.
    #[from]
    #[display("Could not process JSON: {_0}")]
    Json(serde_json::Error),

    /// `retrieve` or `purge` was invoked without a storage key.
    #[display("retrieving requires --key, but it was not provided")]
    MissingRestoreKey,

    /// The endpoint lacks a key the plugin requires.
    #[display("Missing required endpoint key '{key}'")]
    EndpointMissingRequiredData { key: String },

    /// The endpoint key exists but holds the wrong JSON type.
    #[display("Endpoint key '{key}' must be of type {desired_type}")]
    EndpointDataTypeMismatch {
        key: String,
        desired_type: &'static str,
    },
}

impl PluginError {
    /// Unsupported action error without the action filled in.
    pub fn unsupported() -> Self {
        Self::UnsupportedAction {
            action: String::new(),
        }
    }

    pub(crate) fn missing_key(key: &str) -> Self {
        Self::EndpointMissingRequiredData {
            key: key.to_string(),
        }
    }

    pub(crate) fn type_mismatch(key: &str, desired_type: &'static str) -> Self {
        Self::EndpointDataTypeMismatch {
            key: key.to_string(),
            desired_type,
        }
    }

    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => USAGE,
            Self::UnsupportedAction { .. } => UNSUPPORTED_ACTION,
            Self::Exec(_) => EXEC_FAILURE,
            Self::Failure(_) | Self::Io(_) => PLUGIN_FAILURE,
            Self::Json(_) => JSON_FAILURE,
            Self::MissingRestoreKey => RESTORE_KEY_REQUIRED,
            Self::EndpointMissingRequiredData { .. } => ENDPOINT_MISSING_KEY,
            Self::EndpointDataTypeMismatch { .. } => ENDPOINT_BAD_DATA,
        }
    }

    /// Returns `true` if this error stems from a missing endpoint key.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::EndpointMissingRequiredData { .. })
    }
}

/// Exit code of a finished verb: [SUCCESS] on `Ok`, otherwise the error's code.
pub fn exit_code_for<T>(result: &Result<T, PluginError>) -> i32 {
    match result {
        Ok(_) => SUCCESS,
        Err(e) => e.exit_code(),
    }
}

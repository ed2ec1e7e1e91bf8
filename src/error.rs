//! Error types for the SDK client.
//!
//! All fallible operations in this crate return [`SdkError`] through the
//! [`Result`] alias. Errors carry structured context and chain their
//! underlying causes via `#[source]`.
//!
//! ## Error Categories
//!
//! - **Availability**: the simulator is not running or its shared memory
//!   cannot be reached (`SimUnavailable`, `Detached`)
//! - **Lookup**: a requested name is neither a telemetry variable nor a
//!   session-info key (`UnknownVariable`)
//! - **Bounds**: reads outside the mapped region or the recorded range
//!   (`Memory`, `OutOfBounds`)
//! - **Format**: binary layout or session-document parsing failures
//!   (`Parse`)
//! - **Platform**: Windows API failures and unsupported-platform guards

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for SDK operations.
pub type Result<T, E = SdkError> = std::result::Result<T, E>;

/// Main error type for SDK operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SdkError {
    #[error("Simulator unavailable: {reason}")]
    SimUnavailable { reason: String },

    #[error("Not attached to a telemetry source")]
    Detached,

    #[error("'{name}' is neither a telemetry variable nor a session-info key")]
    UnknownVariable { name: String },

    #[error("Record index {index} outside [0, {record_count})")]
    OutOfBounds { index: usize, record_count: usize },

    #[error("Memory access out of range at offset {offset:#x}")]
    Memory { offset: usize },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Telemetry file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Broadcast message failed: {operation}")]
    Broadcast { operation: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl SdkError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::SimUnavailable { .. } => true,
            SdkError::Timeout { .. } => true,
            SdkError::Broadcast { .. } => true,
            #[cfg(windows)]
            SdkError::WindowsApi { .. } => true,
            SdkError::Detached => false,
            SdkError::UnknownVariable { .. } => false,
            SdkError::OutOfBounds { .. } => false,
            SdkError::Memory { .. } => false,
            SdkError::Parse { .. } => false,
            SdkError::File { .. } => false,
            SdkError::UnsupportedPlatform { .. } => false,
        }
    }

    /// Helper constructor for availability errors.
    pub fn sim_unavailable(reason: impl Into<String>) -> Self {
        SdkError::SimUnavailable { reason: reason.into() }
    }

    /// Helper constructor for unknown-name lookups.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        SdkError::UnknownVariable { name: name.into() }
    }

    /// Helper constructor for region reads past the end of the mapping.
    pub fn memory_access_error(offset: usize) -> Self {
        SdkError::Memory { offset }
    }

    /// Helper constructor for structured parse failures.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        SdkError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        SdkError::File { path, source }
    }

    /// Helper constructor for broadcast post failures.
    pub fn broadcast_failed(operation: impl Into<String>) -> Self {
        SdkError::Broadcast { operation: operation.into() }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        SdkError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        SdkError::WindowsApi { operation: operation.into(), source }
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(windows)]
impl From<core::Error> for SdkError {
    fn from(err: core::Error) -> Self {
        SdkError::WindowsApi { operation: "Unknown Windows operation".to_string(), source: err }
    }
}

//! Engine error types
//!
//! Every fallible engine operation returns [`EngineResult`]. Failures are logged
//! at the point where they are detected and then handed back to the caller; the
//! engine never retries and never panics across its public surface.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors reported by the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An argument was malformed (empty string, bad enum combination, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A numeric argument was out of range or not a number
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The operation requires a current context on the calling thread
    #[error("No context is current on this thread")]
    NoCurrentContext,

    /// The window was created without a client API
    #[error("Window has no context")]
    NoWindowContext,

    /// The requested client API is not available
    #[error("API unavailable: {0}")]
    ApiUnavailable(String),

    /// The driver granted a lower version than requested
    #[error("Version unavailable: {0}")]
    VersionUnavailable(String),

    /// No pixel format or EGL config satisfied the hard constraints
    #[error("Format unavailable: {0}")]
    FormatUnavailable(String),

    /// The backend failed
    #[error("Platform error: {0}")]
    PlatformError(#[from] BackendError),

    /// A subsystem was used before it was initialized
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// The window id does not refer to a live window
    #[error("No such window")]
    NoSuchWindow,

    /// The monitor id does not refer to a connected monitor
    #[error("No such monitor")]
    NoSuchMonitor,

    /// The cursor id does not refer to a live cursor
    #[error("No such cursor")]
    NoSuchCursor,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Log the error and hand it back, for `return Err(EngineError::...logged())` sites
    #[must_use]
    pub fn logged(self) -> Self {
        log::error!("{self}");
        self
    }
}

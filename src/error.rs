//! Error taxonomy shared by the command runner and the adapter controller.
use std::io;
use thiserror::Error;

/// Coarse classification of a [`NicError`], for exhaustive handling by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external tool could not be found in the search path.
    ExecutableNotFound,
    /// The external tool ran and returned a non-zero exit code.
    ProcessFailure,
    /// The external tool could not be started for another reason.
    Spawn,
    /// The listing output did not contain the expected separator line.
    ParseFormat,
    /// An unknown admin state token was requested.
    InvalidState,
}

#[derive(Debug, Error)]
/// Hard errors aborting one requested operation.
pub enum NicError {
    #[allow(missing_docs)]
    #[error("Command '{program}' not found. Make sure it is available in PATH")]
    ExecutableNotFound { program: String },

    /// Non-zero exit; `message` follows the stderr → stdout → exit code chain.
    #[error("{message}\nCommand: {command}")]
    ProcessFailure { message: String, command: String },

    #[allow(missing_docs)]
    #[error("Unexpected error while running command: {source}\nCommand: {command}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[allow(missing_docs)]
    #[error("Unable to parse the adapter table (no '---' separator followed by data)")]
    ParseFormat,

    #[allow(missing_docs)]
    #[error("Invalid state '{token}', expected 'enable' or 'disable'")]
    InvalidState { token: String },

    /// Another error prefixed with what was being attempted.
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<NicError>,
    },
}

impl NicError {
    /// Return the [`ErrorKind`] of this error, looking through [`NicError::Operation`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            NicError::ExecutableNotFound { .. } => ErrorKind::ExecutableNotFound,
            NicError::ProcessFailure { .. } => ErrorKind::ProcessFailure,
            NicError::Spawn { .. } => ErrorKind::Spawn,
            NicError::ParseFormat => ErrorKind::ParseFormat,
            NicError::InvalidState { .. } => ErrorKind::InvalidState,
            NicError::Operation { source, .. } => source.kind(),
        }
    }

    /// Wrap `self` with a `context` prefix.
    pub fn context(self, context: impl Into<String>) -> Self {
        NicError::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

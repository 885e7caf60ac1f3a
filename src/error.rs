//! Error types shared across the engine, persistence and host layers.

use std::fmt;
use std::io;

/// Result alias carrying [`GenSynthError`].
pub type Result<T> = std::result::Result<T, GenSynthError>;

/// Errors surfaced by the engine.
///
/// Data coming from outside the session (storage, share payloads, config)
/// degrades to defaults instead of producing one of these; only integration
/// mistakes and explicit decode requests fail.
#[derive(Debug)]
pub enum GenSynthError {
    /// A plugin failed validation when it was activated or registered.
    InvalidPlugin(String),
    /// A plugin id was requested that no catalog entry provides.
    UnknownPlugin(String),
    /// A plugin id was registered twice in the same catalog.
    DuplicatePlugin(String),
    /// A share payload could not be decoded or encoded.
    Share(String),
    /// Wrapper around standard IO errors.
    Io(io::Error),
}

impl GenSynthError {
    pub fn share(message: impl Into<String>) -> Self {
        Self::Share(message.into())
    }
}

impl fmt::Display for GenSynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPlugin(reason) => write!(f, "invalid plugin: {reason}"),
            Self::UnknownPlugin(id) => write!(f, "unknown plugin '{id}'"),
            Self::DuplicatePlugin(id) => write!(f, "plugin '{id}' is already registered"),
            Self::Share(reason) => write!(f, "share payload: {reason}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GenSynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GenSynthError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

//! Error types for loading SoundFont data and driving the engine.

use thiserror::Error;

/// Errors raised while validating and building a [`SoundFontGraph`](crate::SoundFontGraph).
///
/// A failed load leaves the engine serving the previously loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Structural problem with the records (missing terminals, decreasing indices, bad header)
    #[error("malformed SoundFont: {reason}")]
    MalformedFile {
        /// Description of what is wrong.
        reason: String,
    },

    /// A record refers past the end of another list
    #[error("{what} index {index} out of range (length {len})")]
    BadIndex {
        /// Kind of record holding the bad reference.
        what: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the list it indexes into.
        len: usize,
    },

    /// Sample headers exist but there is no sample data
    #[error("SoundFont has sample headers but no sample data")]
    EmptySampleData,
}

impl LoadError {
    /// Create a malformed file error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        LoadError::MalformedFile {
            reason: reason.into(),
        }
    }

    /// Create a bad index error.
    pub fn bad_index(what: &'static str, index: usize, len: usize) -> Self {
        LoadError::BadIndex { what, index, len }
    }
}

/// Errors returned by [`EngineHandle`](crate::EngineHandle) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The event inbox is full; the event was dropped
    #[error("event inbox is full")]
    InboxFull,

    /// The render side has gone away
    #[error("engine has been dropped")]
    Disconnected,

    /// Building the new graph failed
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}

//! Error handling for the TempVis-RS engine
//!
//! This module defines the engine error type and a Result alias for use
//! throughout the crate.

use thiserror::Error;

/// Main error type for TempVis-RS operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A channel with this id is already registered
    #[error("Duplicate channel id: {0}")]
    DuplicateId(String),

    /// No channel with this id is registered
    #[error("Channel not found: {0}")]
    NotFound(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine worker is gone or stopped answering
    #[error("Channel error: {0}")]
    Channel(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Result type alias for TempVis-RS operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

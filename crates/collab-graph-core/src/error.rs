//! Error types for graph construction and validation
//!
//! Fatal problems abort a run and surface as [`GraphError`]. Data problems found
//! while checking a graph are not errors; they are collected as violations in a
//! [`crate::check::ValidationReport`].

use thiserror::Error;

/// Main error type for build and validate operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// Event log or graph document has the wrong shape
    #[error("Invalid input: {0}")]
    InputFormat(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Schema descriptor could not be compiled
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Configuration file is malformed or inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GraphError {
    /// Create an input-format error
    pub fn input_format(msg: impl Into<String>) -> Self {
        GraphError::InputFormat(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        GraphError::FileError(msg.into())
    }

    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        GraphError::ParseError(msg.into())
    }

    /// Create a schema error
    pub fn schema_error(msg: impl Into<String>) -> Self {
        GraphError::SchemaError(msg.into())
    }

    /// Create a configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        GraphError::ConfigError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            GraphError::InputFormat(_)
                | GraphError::FileError(_)
                | GraphError::ParseError(_)
                | GraphError::SchemaError(_)
                | GraphError::ConfigError(_)
        )
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for GraphError {
    fn from(err: serde_yaml::Error) -> Self {
        GraphError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for GraphError {
    fn from(err: toml::de::Error) -> Self {
        GraphError::ParseError(format!("TOML error: {}", err))
    }
}

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

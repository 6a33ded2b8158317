// ABOUTME: Error types for report formatting and writing
// ABOUTME: Wraps serialization and filesystem failures met while emitting run reports

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unknown output format: {format}")]
    UnknownFormat { format: String },

    #[error("Write error: {message}")]
    WriteError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlSerializationError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OutputError>;

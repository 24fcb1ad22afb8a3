use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("Unsupported schema version {found} (expected {expected})")]
    UnsupportedSchemaVersion { found: u32, expected: u32 },
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("Node kind '{0}' has no changeable type")]
    TypeNotChangeable(String),
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),
}

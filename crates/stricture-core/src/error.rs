use thiserror::Error;

use crate::schema::NodeId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid bounds on {node}: {reason}")]
    InvalidBounds { node: NodeId, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Schema document error: {0}")]
    Document(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Document(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::Document(err.to_string())
    }
}

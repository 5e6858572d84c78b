use skirmish_core::MatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Message without a type")]
    MissingType,
    #[error("Unknown message type {0:?}")]
    UnknownType(String),
    #[error("Invalid message: {0}")]
    Invalid(#[from] MatchError),
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

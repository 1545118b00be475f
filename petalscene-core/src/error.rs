//! Error types for PetalScene

use crate::scene::SourceId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PetalSceneError {
    #[error("No listener attached to the scene")]
    NoListener,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    #[error("Voice backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, PetalSceneError>;

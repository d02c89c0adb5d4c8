use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Failed to decode image '{name}': {reason}")]
    Decode { name: String, reason: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata read error: {0}")]
    Metadata(String),

    #[error("Embedding extraction failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VisionError {
    pub(crate) fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;

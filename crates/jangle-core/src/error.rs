//! Error types for Jangle

/// Result type alias using Jangle's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Jangle operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model artifact loading errors
    #[error("model error: {0}")]
    Model(String),

    /// Image decoding and preprocessing errors
    #[error("image error: {0}")]
    Image(String),

    /// Forward pass and output shape errors
    #[error("inference error: {0}")]
    Inference(String),

    /// Vocabulary does not match the expected labels
    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Manifest parsing errors
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new image error
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new vocabulary error
    pub fn vocabulary(msg: impl Into<String>) -> Self {
        Self::Vocabulary(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

use thiserror::Error;

/// Top-level error type for the museum guide.
///
/// Subsystem crates define their own error types; this one covers startup
/// concerns (configuration, secrets, I/O) that every crate may hit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GuideError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required credential is absent from the secret store. Fatal at startup.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("API error: {0}")]
    Api(String),
}

impl GuideError {
    /// Text shown to the user when this error stops the session from starting.
    pub fn user_message(&self) -> String {
        match self {
            GuideError::MissingCredential(name) => format!(
                "API key not found. Please set '{}' in your secrets.",
                name
            ),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for GuideError {
    fn from(err: toml::de::Error) -> Self {
        GuideError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GuideError {
    fn from(err: toml::ser::Error) -> Self {
        GuideError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GuideError {
    fn from(err: serde_json::Error) -> Self {
        GuideError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for guide operations.
pub type Result<T> = std::result::Result<T, GuideError>;

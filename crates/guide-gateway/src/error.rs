//! Error types for model gateway calls.

/// Failures reported by the model provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The provider signalled a rate or usage limit.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Any other provider-side or transport failure.
    #[error("{0}")]
    Service(String),
}

impl GatewayError {
    pub fn is_quota(&self) -> bool {
        matches!(self, GatewayError::QuotaExceeded(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            GatewayError::QuotaExceeded(err.to_string())
        } else {
            GatewayError::Service(err.to_string())
        }
    }
}

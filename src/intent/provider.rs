use std::error::Error;
use std::fmt;

use serde_json::Value;

use crate::domain::TransactionType;

#[derive(Debug)]
pub enum ProviderError {
    RateLimited,
    Timeout,
    /// 5xx-class upstream failure.
    ServerError(String),
    /// The provider answered but the payload was unusable.
    Malformed(String),
    /// Request-side problem; retrying will not help.
    Rejected(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::Timeout | ProviderError::ServerError(_)
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::RateLimited => write!(f, "provider rate limited the call"),
            ProviderError::Timeout => write!(f, "provider call timed out"),
            ProviderError::ServerError(detail) => write!(f, "provider server error: {}", detail),
            ProviderError::Malformed(detail) => write!(f, "unusable provider reply: {}", detail),
            ProviderError::Rejected(detail) => write!(f, "provider rejected request: {}", detail),
        }
    }
}

impl Error for ProviderError {}

/// What the document classifier extracted from a receipt-like image. Fields
/// it could not read stay `None`; `confidence` gates whether the extraction
/// is trusted directly or handed to the general interpreter as a hint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentGuess {
    pub confidence: f64,
    pub merchant: Option<String>,
    pub amount: Option<f64>,
    pub tx_type: Option<TransactionType>,
    pub date: Option<String>,
}

/// Boundary to the language-model service. Implementations own transport,
/// auth, and prompt assembly; callers only see JSON in and JSON out.
pub trait IntentProvider {
    /// Interprets a free-text request against a context snapshot and returns
    /// the raw reply document.
    fn interpret(&self, request: &str, context: &Value) -> Result<Value, ProviderError>;

    /// Extracts structured transaction fields from an attached document.
    fn classify_document(&self, image: &[u8], caption: &str)
        -> Result<DocumentGuess, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::ProviderError;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::ServerError("502".to_string()).is_retryable());
        assert!(!ProviderError::Malformed("not json".to_string()).is_retryable());
        assert!(!ProviderError::Rejected("bad key".to_string()).is_retryable());
    }
}

use thiserror::Error;

pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "I had a little trouble calculating those prices. Could you try again?";

pub const REQUEST_FALLBACK_MESSAGE: &str =
    "Oops! Something went wrong while connecting with our AI assistant.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// No usable response from the AI service (network, auth, quota).
    #[error("{0}")]
    RequestFailure(String),

    /// The service answered but the payload is not a complete prediction.
    #[error("{}", MALFORMED_RESPONSE_MESSAGE)]
    MalformedResponse,
}

impl PredictionError {
    pub fn request(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            PredictionError::RequestFailure(REQUEST_FALLBACK_MESSAGE.to_string())
        } else {
            PredictionError::RequestFailure(message)
        }
    }
}

// reqwest's Display stops at the top-level error; append the causes so
// "operation timed out" or "connection refused" reach the user.
impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        PredictionError::request(message)
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_shows_fixed_message() {
        assert_eq!(
            PredictionError::MalformedResponse.to_string(),
            MALFORMED_RESPONSE_MESSAGE
        );
    }

    #[test]
    fn request_failure_keeps_message_or_falls_back() {
        assert_eq!(
            PredictionError::request("API key not valid").to_string(),
            "API key not valid"
        );
        assert_eq!(
            PredictionError::request("  ").to_string(),
            REQUEST_FALLBACK_MESSAGE
        );
    }
}

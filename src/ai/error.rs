use thiserror::Error;

pub const QUOTA_HINT: &str = "rate limit reached; back off and retry later";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to reach model endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("model quota exhausted (status {status}): {message} ({hint})", hint = QUOTA_HINT)]
    Quota { status: u16, message: String },
    #[error("model endpoint returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model response malformed: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::Transport(_) => "transport",
            ModelError::Quota { .. } => "quota",
            ModelError::Api { .. } => "api",
            ModelError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Provider message attached to quota/API failures.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            ModelError::Quota { message, .. } | ModelError::Api { message, .. } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

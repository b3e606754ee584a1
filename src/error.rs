use std::fmt;
use thiserror::Error;

/// External collaborator that produced an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    VoiceProvider,
    Completion,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::VoiceProvider => write!(f, "voice provider"),
            Service::Completion => write!(f, "completion provider"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EvalError {
    /// Missing or unusable caller input; the message is shown to the caller.
    #[error("{0}")]
    Validation(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: Service,
        status: u16,
        body: String,
    },

    /// The completion reply was not a JSON document. `preview` is bounded.
    #[error("malformed completion reply: {reason}")]
    MalformedResponse { reason: String, preview: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl EvalError {
    pub fn validation(message: impl Into<String>) -> Self {
        EvalError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EvalError::Validation(_))
    }
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;

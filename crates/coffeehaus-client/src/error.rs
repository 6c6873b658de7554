use thiserror::Error;

/// Failure of a user-service call. `Display` is the string shown to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Carries the body's `message`, which profile writes show instead.
    #[error("Your session has expired. Please sign in again.")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// HTTP status of the failed call, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Conflict(_) => Some(409),
            ClientError::Validation(_) => Some(400),
            ClientError::Server { status, .. } => Some(*status),
        }
    }

    /// Builds the error for a non-2xx answer. `message` is the body's
    /// `message` field, empty when the body had none.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::Unauthorized(message),
            409 => ClientError::Conflict(message),
            400 if !message.is_empty() => ClientError::Validation(message),
            _ => ClientError::Server { status, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

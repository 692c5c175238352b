use thiserror::Error;

/// Problems caught on the client before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("from date {from} is after to date {to}")]
    DateOrder { from: String, to: String },
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: String, value: String },
    #[error("unknown filter field {0:?}")]
    UnknownField(String),
    #[error("{field} must be a positive integer, got {value:?}")]
    NotPositive { field: &'static str, value: String },
    #[error("{0}")]
    Form(String),
}

impl ValidationError {
    pub fn invalid_value(field: &str, value: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server answered with an envelope whose status is not `0000`.
    #[error("{message} (status {status})")]
    Api { status: String, message: String },
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("session expired or not logged in")]
    Unauthorized,
    /// Login refused, with the server's reason.
    #[error("login failed: {0}")]
    InvalidCredentials(String),
    #[error("{0} requires a super administrator")]
    Forbidden(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ConsoleError {
    /// Only transport failures and server-side faults are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Transport(_) => true,
            ConsoleError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Decode(err.to_string())
        } else if err.is_timeout() {
            ConsoleError::Transport(format!("timed out: {err}"))
        } else {
            ConsoleError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Decode(err.to_string())
    }
}

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ConsoleError::Transport("reset".into()).is_retryable());
        assert!(ConsoleError::Http {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ConsoleError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!ConsoleError::Api {
            status: "1001".into(),
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ConsoleError::Unauthorized.is_retryable());
        assert!(!ConsoleError::InvalidCredentials("bad password".into()).is_retryable());
    }

    #[test]
    fn test_api_error_message_is_human_readable() {
        let err = ConsoleError::Api {
            status: "2001".into(),
            message: "Agent not found".into(),
        };
        assert_eq!(err.to_string(), "Agent not found (status 2001)");
    }
}

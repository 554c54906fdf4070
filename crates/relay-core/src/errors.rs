/// Failures raised by the backend client.
///
/// Every variant is "handled" from the user's point of view: the pipeline turns
/// any of them into a generic "try again later" reply without leaking details.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend authentication error (status {status})")]
    Auth { status: u16 },

    #[error("backend unavailable: {reason}")]
    Unavailable { status: Option<u16>, reason: String },

    #[error("backend request timed out")]
    Timeout,

    #[error("backend returned invalid JSON: {0}")]
    BadResponse(String),

    #[error("backend rejected request (status {status})")]
    Client { status: u16 },
}

impl BackendError {
    /// HTTP status attached to the failure, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Auth { status } | BackendError::Client { status } => Some(*status),
            BackendError::Unavailable { status, .. } => *status,
            BackendError::Timeout | BackendError::BadResponse(_) => None,
        }
    }
}

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the pipeline can
/// tell backend failures (user-facing "try again") from everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("ticket store error: {0}")]
    Store(#[from] StoreError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event context missing: {0}")]
    MissingContext(&'static str),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

/// Shared key-value store failure (connection refused, protocol error, ...).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use roster_model::UserId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failures reported by a [`crate::UserApi`] collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP error, status: {status}")]
    Status { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when the failure came from a non-2xx response.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    /// Collection retrieval failed; the cache keeps its previous contents.
    #[error("Failed to fetch users: {source}")]
    FetchFailure {
        #[source]
        source: ApiError,
    },

    /// The remote rejected a delete; the cache was rolled back.
    #[error("Failed to delete user {id}: {source}")]
    MutationFailure {
        id: UserId,
        #[source]
        source: ApiError,
    },

    /// The session was torn down while the request was in flight.
    #[error("Session torn down")]
    TornDown,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The collaborator error behind a fetch or mutation failure.
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::FetchFailure { source } | Self::MutationFailure { source, .. } => Some(source),
            Self::TornDown | Self::Config(_) => None,
        }
    }
}

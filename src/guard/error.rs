use thiserror::Error;

/// Errors raised while pairing with, or relaying actions to, an Altura Guard wallet
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Please enter Altura guard code.")]
    InputMissing,

    #[error("Please connect to Altura Guard first.")]
    NotConnected,

    #[error("An Altura Guard session is already active")]
    AlreadyConnected,

    #[error("Failed to connect to Altura Guard: {0}")]
    ConnectFailure(String),

    #[error("{action} failed: {reason}")]
    ActionFailure { action: String, reason: String },

    #[error("Rejected")]
    Rejected,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session check failed: {0}")]
    CheckFailed(String),

    #[error("No terminal response for request {request_id} within {waited_secs}s")]
    DeadlineExceeded { request_id: String, waited_secs: u64 },

    #[error("Waiting for request {request_id} was cancelled")]
    Cancelled { request_id: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unexpected HTTP {status} from Altura API: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GuardError {
    /// True when the caller can fix the problem without anything changing upstream
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InputMissing
                | Self::NotConnected
                | Self::AlreadyConnected
                | Self::Rejected
                | Self::InvalidAddress(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;

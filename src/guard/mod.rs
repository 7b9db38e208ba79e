//! Client side of the Altura Guard pairing and signing protocol.
//!
//! A wallet is paired with a guard code, which yields a [`Session`]. Every
//! signing action is then submitted as a [`PendingRequest`] and resolved by
//! polling until the server returns something other than `204 No Content`.

mod client;
mod error;
pub mod interpreter;
pub mod poller;
pub mod request;

pub use client::{GuardApi, GuardClient};
pub use error::{GuardError, Result};
pub use interpreter::{classify, Verdict};
pub use poller::{PollPolicy, Poller};
pub use request::{ActionRequest, TransactionParams};

use serde::{Deserialize, Serialize};

/// A paired wallet session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub address: String,
}

/// A submitted action waiting for the wallet to answer.
///
/// Not `Clone`; [`Poller::wait`] consumes it.
#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct PendingRequest {
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Result of a single poll call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// HTTP 204, the wallet has not answered yet
    Pending,
    /// Any other status
    Resolved(Resolution),
}

/// Terminal poll payload, with the status it arrived under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: u16,
    pub body: String,
}

/// Terminal state a poll loop ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Resolved,
    Expired,
}

impl Resolution {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `Expired` for non-2xx statuses (e.g. 404 "invalid request id"),
    /// `Resolved` otherwise.
    pub fn state(&self) -> PollState {
        if (200..300).contains(&self.status) {
            PollState::Resolved
        } else {
            PollState::Expired
        }
    }
}

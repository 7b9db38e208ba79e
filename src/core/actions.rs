use super::session::{SessionHandle, SessionLease};
use crate::config::DemoConfig;
use crate::guard::{
    classify, ActionRequest, GuardApi, GuardError, PollState, Poller, Result, Session, Verdict,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Actions the relay exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "connect")]
    Connect,
    #[serde(rename = "signMessage")]
    SignMessage,
    #[serde(rename = "sendETH")]
    SendEth,
    #[serde(rename = "sendContractCall")]
    SendContractCall,
    #[serde(rename = "revoke")]
    Revoke,
    #[serde(rename = "checkSession")]
    CheckSession,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Connect => "connect",
            Action::SignMessage => "signMessage",
            Action::SendEth => "sendETH",
            Action::SendContractCall => "sendContractCall",
            Action::Revoke => "revoke",
            Action::CheckSession => "checkSession",
        }
    }
}

/// What a completed action reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Connected(Session),
    /// Notice to show the user, e.g. `Success, hash: 0x...`
    Notice(String),
}

/// Runs the demo actions against the paired wallet.
///
/// Each signing action leases the current session, submits one request and
/// waits for it under the session's cancellation token, so revoking or
/// losing the session stops the wait.
#[derive(Clone)]
pub struct GuardService {
    api: Arc<dyn GuardApi>,
    sessions: SessionHandle,
    poller: Poller,
    demo: DemoConfig,
}

impl GuardService {
    pub fn new(
        api: Arc<dyn GuardApi>,
        sessions: SessionHandle,
        poller: Poller,
        demo: DemoConfig,
    ) -> Self {
        Self {
            api,
            sessions,
            poller,
            demo,
        }
    }

    pub fn sessions(&self) -> &SessionHandle {
        &self.sessions
    }

    pub async fn perform(&self, action: Action, guard_code: Option<&str>) -> Result<ActionOutcome> {
        tracing::info!("Performing action: {}", action.name());
        match action {
            Action::Connect => {
                let session = self.connect(guard_code).await?;
                Ok(ActionOutcome::Connected(session))
            }
            Action::SignMessage => self.sign_message().await.map(ActionOutcome::Notice),
            Action::SendEth => self.send_native_token().await.map(ActionOutcome::Notice),
            Action::SendContractCall => self.send_contract_call().await.map(ActionOutcome::Notice),
            Action::Revoke => {
                self.sessions.revoke().await?;
                Ok(ActionOutcome::Notice("Session Revoked!".to_string()))
            }
            Action::CheckSession => {
                self.sessions.check().await?;
                Ok(ActionOutcome::Notice("Session: active".to_string()))
            }
        }
    }

    pub async fn connect(&self, guard_code: Option<&str>) -> Result<Session> {
        let code = guard_code.ok_or(GuardError::InputMissing)?;
        self.sessions.connect(code).await
    }

    /// Exchange a guard code for a session without keeping it here; the
    /// caller holds the token.
    pub async fn request_pairing(&self, guard_code: Option<&str>) -> Result<Session> {
        let code = guard_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or(GuardError::InputMissing)?;
        self.api.add_request(code).await
    }

    pub async fn sign_message(&self) -> Result<String> {
        let lease = self.sessions.lease().await?;
        let request = ActionRequest::sign_message(&self.demo.message);
        self.run(Action::SignMessage, &lease, request, "signature")
            .await
    }

    /// Send the configured native amount to the configured recipient
    pub async fn send_native_token(&self) -> Result<String> {
        let lease = self.sessions.lease().await?;
        let request = ActionRequest::native_transfer(
            &lease.session.address,
            &self.demo.recipient,
            self.demo.transfer_amount,
            self.demo.chain_id,
        )?;
        self.run(Action::SendEth, &lease, request, "hash").await
    }

    /// Approve the connected address to spend the configured token amount
    pub async fn send_contract_call(&self) -> Result<String> {
        let lease = self.sessions.lease().await?;
        let address = &lease.session.address;
        let request = ActionRequest::approve(
            address,
            &self.demo.token_contract,
            address,
            self.demo.approve_amount,
            self.demo.chain_id,
        )?;
        self.run(Action::SendContractCall, &lease, request, "hash")
            .await
    }

    async fn run(
        &self,
        action: Action,
        lease: &SessionLease,
        request: ActionRequest,
        label: &str,
    ) -> Result<String> {
        let token = &lease.session.token;

        let pending = self
            .api
            .submit(token, &request)
            .await
            .map_err(|e| GuardError::ActionFailure {
                action: action.name().to_string(),
                reason: e.to_string(),
            })?;

        let resolution = self.poller.wait(token, pending, &lease.cancel).await?;

        // Non-2xx terminal bodies are errors, not wallet answers
        if resolution.state() == PollState::Expired {
            return Err(GuardError::Status {
                status: resolution.status,
                body: resolution.body,
            });
        }

        match classify(&resolution.body) {
            Verdict::Rejected => {
                tracing::info!("{} rejected on device", action.name());
                Err(GuardError::Rejected)
            }
            verdict => Ok(verdict.notice(label)),
        }
    }
}

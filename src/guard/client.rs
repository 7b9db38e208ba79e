use super::{ActionRequest, GuardError, PendingRequest, PollOutcome, Resolution, Result, Session};
use crate::config::GuardConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Calls into the Altura Guard API.
///
/// `GuardClient` is the HTTP implementation; the session actor, poller and
/// action service only depend on this trait.
#[async_trait]
pub trait GuardApi: Send + Sync {
    /// Exchange a guard code for a session
    async fn add_request(&self, code: &str) -> Result<Session>;

    /// Submit an action bound to `token`
    async fn submit(&self, token: &str, request: &ActionRequest) -> Result<PendingRequest>;

    /// Poll once for the outcome of `request_id`
    async fn get_response(&self, token: &str, request_id: &str) -> Result<PollOutcome>;

    /// Ask the server whether `token` is still valid
    async fn check_session(&self, token: &str) -> Result<()>;

    /// Revoke `token` server-side
    async fn revoke_session(&self, token: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct AddRequestResponse {
    token: String,
    address: String,
}

/// HTTP client for the Altura Guard API.
///
/// Construct one per process at startup and share it behind an `Arc`.
#[derive(Clone)]
pub struct GuardClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl GuardClient {
    pub fn new(config: &GuardConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("guardrelay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/alturaguard/{}", self.api_base, endpoint)
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        tracing::debug!("POST {}", endpoint);
        Ok(self.http.post(self.url(endpoint)).json(&body).send().await?)
    }
}

/// Turn a non-2xx response into `GuardError::Status`
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GuardError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl GuardApi for GuardClient {
    async fn add_request(&self, code: &str) -> Result<Session> {
        let mut request = self.http.post(self.url("addRequest"));
        if let Some(key) = &self.api_key {
            request = request.query(&[("apiKey", key)]);
        }

        let response = request.json(&json!({ "code": code })).send().await?;
        let parsed: AddRequestResponse = ensure_success(response).await?.json().await?;

        tracing::info!("Paired with wallet {}", parsed.address);
        Ok(Session {
            token: parsed.token,
            address: parsed.address,
        })
    }

    async fn submit(&self, token: &str, request: &ActionRequest) -> Result<PendingRequest> {
        let body = json!({
            "token": token,
            "reqParameters": request.to_parameters(),
        });
        let response = self.post("request", body).await?;
        let pending: PendingRequest = ensure_success(response).await?.json().await?;

        tracing::info!(
            "Submitted {} request: request_id={}",
            request.kind(),
            pending.request_id
        );
        Ok(pending)
    }

    async fn get_response(&self, token: &str, request_id: &str) -> Result<PollOutcome> {
        let body = json!({ "token": token, "requestId": request_id });
        let response = self.post("getResponse", body).await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(PollOutcome::Pending);
        }

        let raw = response.text().await?;
        Ok(PollOutcome::Resolved(Resolution::new(
            status.as_u16(),
            decode_body(&raw),
        )))
    }

    async fn check_session(&self, token: &str) -> Result<()> {
        let response = self
            .post("checkSession", json!({ "token": token }))
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn revoke_session(&self, token: &str) -> Result<()> {
        let response = self
            .post("revokeSession", json!({ "token": token }))
            .await?;
        ensure_success(response).await?;
        tracing::info!("Session revoked server-side");
        Ok(())
    }
}

/// Poll bodies are opaque strings, but servers usually send them JSON-encoded
/// (`"Rejected"` with quotes). Unwrap a JSON string; leave anything else as-is.
fn decode_body(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(s)) => s,
        _ => raw.to_string(),
    }
}

use crate::core::utils::shorten;
use crate::core::Action;
use crate::guard::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/guard`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardActionRequest {
    pub action: Action,
    #[serde(default)]
    pub guard_code: Option<String>,
}

/// Successful action reply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,
}

impl ActionReply {
    pub fn notice(signature: String) -> Self {
        Self {
            success: true,
            signature: Some(signature),
            address: None,
            short_address: None,
        }
    }

    pub fn connected(session: &Session) -> Self {
        Self {
            success: true,
            signature: None,
            address: Some(session.address.clone()),
            short_address: Some(shorten(&session.address)),
        }
    }
}

/// Query of `GET /api/sendRequest`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestQuery {
    #[serde(default)]
    pub guard_code: Option<String>,
}

/// Reply of `GET /api/sendRequest`
#[derive(Debug, Serialize, Deserialize)]
pub struct SendRequestReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Session>,
}

/// Current session status
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_request_accepts_camel_case() {
        let req: GuardActionRequest =
            serde_json::from_str(r#"{"action":"connect","guardCode":"ABC123"}"#).unwrap();
        assert_eq!(req.action, Action::Connect);
        assert_eq!(req.guard_code.as_deref(), Some("ABC123"));

        let req: GuardActionRequest = serde_json::from_str(r#"{"action":"revoke"}"#).unwrap();
        assert!(req.guard_code.is_none());
    }

    #[test]
    fn test_action_request_rejects_unknown_or_missing_action() {
        assert!(serde_json::from_str::<GuardActionRequest>(r#"{"action":"sendBTC"}"#).is_err());
        assert!(serde_json::from_str::<GuardActionRequest>(r#"{"guardCode":"ABC"}"#).is_err());
    }

    #[test]
    fn test_connected_reply_shortens_address() {
        let session = Session {
            token: "T1".to_string(),
            address: "0x8B0eeCABAc71696eb65a63a3a15E3Fc5f83BD3D9".to_string(),
        };
        let json = serde_json::to_value(ActionReply::connected(&session)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["shortAddress"], "0x8B...3D9");
        assert!(json.get("signature").is_none());
        assert!(json.get("token").is_none());
    }
}

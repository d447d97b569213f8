// Wire types for the visitor pass endpoints.
//
// The backend speaks camelCase JSON and is loose about which fields it
// echoes back, so every response field except `code` is optional.
// Timestamps stay as raw strings here; parsing (and failing safe on
// garbage) is the core crate's job.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/visitor-passes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePassRequest {
    pub code: String,
    pub visitor_name: String,
    /// The exact string encoded in the pass QR symbol.
    pub qr_data: String,
    /// RFC 3339 instant with a UTC designator.
    pub expires_at: String,
}

/// A visitor pass as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRecord {
    /// Backend identifier. Mongo-style backends send `_id`.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// `active`, `expired`, `cancelled`, or whatever the backend invents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Server-computed seconds of validity left, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<i64>,
}

/// Response of `POST /api/visitor-passes`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreatePassResponse {
    #[serde(default)]
    pub pass: Option<PassRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/visitor-passes/verify`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub code: &'a str,
}

/// Response of `POST /api/visitor-passes/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pass: Option<PassRecord>,
    /// Seconds left according to the server. Authoritative when present.
    #[serde(default)]
    pub time_remaining: Option<i64>,
}

/// Response of `GET /api/visitor-passes`. Some deployments wrap the list,
/// some return the bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPassesResponse {
    Wrapped { passes: Vec<PassRecord> },
    Bare(Vec<PassRecord>),
}

impl ListPassesResponse {
    pub fn into_passes(self) -> Vec<PassRecord> {
        match self {
            Self::Wrapped { passes } | Self::Bare(passes) => passes,
        }
    }
}

/// Error body shape: `{"message": "..."}` or `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pass_record_accepts_mongo_id() {
        let record: PassRecord = serde_json::from_value(json!({
            "_id": "65a1f0",
            "code": "ABC234",
            "visitorName": "Asha",
            "expiresAt": "2024-01-01T00:30:00Z"
        }))
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("65a1f0"));
        assert_eq!(record.visitor_name.as_deref(), Some("Asha"));
        assert!(record.created_at.is_none());
    }

    #[test]
    fn create_request_is_camel_case() {
        let req = CreatePassRequest {
            code: "ABC234".into(),
            visitor_name: "Visitor".into(),
            qr_data: "{}".into(),
            expires_at: "2024-01-01T00:30:00Z".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "code": "ABC234",
                "visitorName": "Visitor",
                "qrData": "{}",
                "expiresAt": "2024-01-01T00:30:00Z"
            })
        );
    }

    #[test]
    fn error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_value(json!({"message": "bad code", "error": "x"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad code"));

        let blank: ErrorBody = serde_json::from_value(json!({"message": " "})).unwrap();
        assert_eq!(blank.into_message(), None);
    }
}

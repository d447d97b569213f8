// ── Visitor pass domain type ──

use chrono::{DateTime, Utc};
use gatepass_api::PassRecord;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::PassId;
use crate::error::CoreError;
use crate::lifecycle::{
    CountdownView, PassPayload, countdown, expires_at, format_instant, is_expired, parse_instant,
};

/// Name used when the visitor field is left blank.
pub const DEFAULT_VISITOR_NAME: &str = "Visitor";

/// Lifecycle status as stored. See [`VisitorPass::effective_status`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PassStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

/// Trim the visitor name; blank becomes [`DEFAULT_VISITOR_NAME`].
pub fn normalize_visitor_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => DEFAULT_VISITOR_NAME.to_owned(),
    }
}

/// A visitor pass as the client holds it.
///
/// `expires_at` is `None` when the backend sent something unparseable;
/// such a pass is always treated as expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorPass {
    pub id: PassId,
    pub code: String,
    pub visitor_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// The exact string encoded in the QR symbol.
    pub qr_payload: String,
    pub status: PassStatus,
}

impl VisitorPass {
    /// Build a fresh pass at `now`: expiry fixed at creation, payload
    /// snapshotted, id local until the backend assigns one.
    pub fn draft(code: &str, visitor_name: Option<&str>, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let visitor_name = normalize_visitor_name(visitor_name);
        let expires = expires_at(now);
        let qr_payload = PassPayload::new(code, &visitor_name, now, expires).encode()?;

        Ok(Self {
            id: PassId::local(),
            code: code.to_owned(),
            visitor_name,
            created_at: Some(now),
            expires_at: Some(expires),
            qr_payload,
            status: PassStatus::Active,
        })
    }

    /// Status after the wall-clock check. Cancellation sticks; anything
    /// past (or without) an expiry reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PassStatus {
        match (self.status, self.expires_at) {
            (PassStatus::Cancelled, _) => PassStatus::Cancelled,
            (_, Some(exp)) if !is_expired(exp, now) => self.status,
            _ => PassStatus::Expired,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == PassStatus::Active
    }

    /// Countdown view at `now`. Cancelled passes read as expired.
    pub fn countdown(&self, now: DateTime<Utc>) -> CountdownView {
        match self.expires_at {
            Some(exp) if self.status != PassStatus::Cancelled => countdown(exp, now),
            _ => countdown(now, now),
        }
    }

    /// The QR payload, rebuilt from the pass fields if the backend did not
    /// echo one back.
    pub fn payload_string(&self) -> Result<String, CoreError> {
        if !self.qr_payload.is_empty() {
            return Ok(self.qr_payload.clone());
        }
        match (self.created_at, self.expires_at) {
            (Some(created), Some(expires)) => {
                Ok(PassPayload::new(&self.code, &self.visitor_name, created, expires).encode()?)
            }
            _ => Err(CoreError::ValidationFailed {
                message: format!("pass {} has no usable timestamps for a QR payload", self.code),
            }),
        }
    }

    /// Merge a backend record over this draft, keeping local values the
    /// backend did not echo.
    pub fn merge_record(self, record: PassRecord) -> Self {
        let remote = Self::from(record);
        Self {
            id: if remote.id.is_local() { self.id } else { remote.id },
            created_at: remote.created_at.or(self.created_at),
            expires_at: remote.expires_at.or(self.expires_at),
            qr_payload: if remote.qr_payload.is_empty() {
                self.qr_payload
            } else {
                remote.qr_payload
            },
            ..remote
        }
    }

    /// Wire form for the create call.
    pub fn to_create_request(&self) -> gatepass_api::CreatePassRequest {
        gatepass_api::CreatePassRequest {
            code: self.code.clone(),
            visitor_name: self.visitor_name.clone(),
            qr_data: self.qr_payload.clone(),
            expires_at: self.expires_at.map(format_instant).unwrap_or_default(),
        }
    }
}

impl From<PassRecord> for VisitorPass {
    fn from(r: PassRecord) -> Self {
        let created_at = r.created_at.as_deref().and_then(parse_instant);
        // A malformed expiry stays `None` (expired); only a missing one is
        // derived from the creation instant.
        let expires_at = match r.expires_at.as_deref() {
            Some(raw) => parse_instant(raw),
            None => created_at.map(expires_at),
        };
        let status = r
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            id: r.id.map_or_else(PassId::local, PassId::from),
            code: r.code,
            visitor_name: normalize_visitor_name(r.visitor_name.as_deref()),
            created_at,
            expires_at,
            qr_payload: r.qr_data.unwrap_or_default(),
            status,
        }
    }
}

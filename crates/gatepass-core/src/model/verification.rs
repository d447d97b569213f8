// ── Gate verification result ──

use chrono::{DateTime, Utc};
use gatepass_api::VerifyResponse;
use serde::{Deserialize, Serialize};

use super::VisitorPass;
use crate::lifecycle::{CountdownView, view_for_secs};

/// Outcome of checking a code at the gate. The backend is the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    pub message: Option<String>,
    pub pass: Option<VisitorPass>,
    /// Server-computed seconds left.
    pub time_remaining: Option<i64>,
}

impl Verification {
    /// Seconds left: the server's figure when present, otherwise the
    /// client countdown for the returned pass.
    pub fn effective_remaining(&self, now: DateTime<Utc>) -> u64 {
        if !self.valid {
            return 0;
        }
        match (self.time_remaining, &self.pass) {
            (Some(secs), _) => u64::try_from(secs).unwrap_or(0),
            (None, Some(pass)) => pass.countdown(now).remaining_seconds,
            (None, None) => 0,
        }
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> CountdownView {
        view_for_secs(self.effective_remaining(now))
    }
}

impl From<VerifyResponse> for Verification {
    fn from(r: VerifyResponse) -> Self {
        // Some deployments only report the figure on the nested pass.
        let time_remaining = r
            .time_remaining
            .or_else(|| r.pass.as_ref().and_then(|p| p.time_remaining));
        Self {
            valid: r.valid,
            message: r.message,
            pass: r.pass.map(VisitorPass::from),
            time_remaining,
        }
    }
}

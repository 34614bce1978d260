use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-owned marker saying "the next delete of `member_id` is confirmed".
/// It lives with the caller (a cookie in the web layer), never in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelete {
    pub member_id: String,
    pub armed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing is deleted; the caller keeps this token for the next attempt.
    Arm(PendingDelete),
    /// The token matched; go ahead and delete.
    Confirm,
}

impl PendingDelete {
    pub fn arm(member_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            member_id: member_id.to_string(),
            armed_at: now,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(self.armed_at).to_std() {
            Ok(elapsed) => elapsed <= ttl,
            // Armed in the future: clock skew or a forged value.
            Err(_) => false,
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = general_purpose::URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

pub fn decide(
    pending: Option<&PendingDelete>,
    member_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Decision {
    match pending {
        Some(token) if token.member_id == member_id && token.is_live(now, ttl) => Decision::Confirm,
        _ => Decision::Arm(PendingDelete::arm(member_id, now)),
    }
}

//! Session status and lifecycle types for UI binding.
//!
//! [`SessionHealth`] is the non-authoritative indicator a UI renders;
//! [`SessionState`] is the lifecycle state of the session as a whole.

use serde::{Deserialize, Serialize};

/// Health status derived from the stored credentials at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Neither credential is stored.
    Unauthenticated,
    /// Access credential valid for longer than the warning threshold.
    Healthy,
    /// Access credential still valid but inside the warning threshold.
    ExpiringSoon,
    /// Access credential missing, undecodable or past its expiry.
    Expired,
}

impl SessionStatus {
    /// Returns true while the access credential is still usable.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Healthy | Self::ExpiringSoon)
    }

    /// Returns true if the UI should draw attention to the session.
    #[must_use]
    pub const fn needs_attention(self) -> bool {
        matches!(self, Self::ExpiringSoon | Self::Expired)
    }

    /// Stable label, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Healthy => "healthy",
            Self::ExpiringSoon => "expiring-soon",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a health evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHealth {
    /// Derived status.
    pub status: SessionStatus,
    /// Seconds until the access credential expires, when it decodes.
    pub seconds_remaining: Option<i64>,
    /// Human-readable summary.
    pub message: String,
}

impl SessionHealth {
    /// Builds a health report with the standard message for `status`.
    #[must_use]
    pub fn new(status: SessionStatus, seconds_remaining: Option<i64>) -> Self {
        let message = match (status, seconds_remaining) {
            (SessionStatus::Unauthenticated, _) => "Not signed in".to_string(),
            (SessionStatus::Healthy, Some(secs)) => {
                format!("Session active for {}", humanize(secs))
            }
            (SessionStatus::Healthy, None) => "Session active".to_string(),
            (SessionStatus::ExpiringSoon, Some(secs)) => {
                format!("Session expires in {}", humanize(secs))
            }
            (SessionStatus::ExpiringSoon, None) => "Session expires soon".to_string(),
            (SessionStatus::Expired, _) => "Session expired".to_string(),
        };
        Self {
            status,
            seconds_remaining,
            message,
        }
    }
}

fn humanize(secs: i64) -> String {
    if secs >= 7200 {
        format!("{} hours", secs / 3600)
    } else if secs >= 120 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{secs} seconds")
    }
}

/// Lifecycle state of the session. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Neither credential present.
    Unauthenticated,
    /// Access credential present and unexpired.
    Authenticated,
    /// Access stale, refresh credential usable, exchange underway.
    Refreshing,
    /// Access stale and refresh credential missing or expired.
    /// Terminal until the next login.
    Expired,
}

impl SessionState {
    /// Stable label for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

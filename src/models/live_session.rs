use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::caller::Caller;

/// The media kind of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Audio,
    Video,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Audio => f.write_str("audio"),
            SessionKind::Video => f.write_str("video"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(SessionKind::Audio),
            "video" => Ok(SessionKind::Video),
            other => Err(format!("Unknown session kind: {}", other)),
        }
    }
}

/// The user hosting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    /// The ID of the host.
    pub user_id: Uuid,
    /// The host's display name at creation time.
    pub display_name: String,
}

impl From<&Caller> for HostIdentity {
    fn from(caller: &Caller) -> Self {
        Self {
            user_id: caller.id,
            display_name: caller.display_name.clone(),
        }
    }
}

/// A live audio/video session tracked in memory.
///
/// The host and organization are fixed at creation. A closed or evicted
/// session is simply absent from the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSession {
    /// The process-unique session id.
    pub id: String,
    /// The session title.
    pub title: String,
    /// Audio or video.
    pub kind: SessionKind,
    /// The user who created the session.
    pub host: HostIdentity,
    /// The organization that owns the session.
    pub organization_id: Uuid,
    /// The number of participants currently joined.
    pub participant_count: u32,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// Whether the session is live.
    pub is_live: bool,
}

impl LiveSession {
    /// Whether `user_id` is the host of this session.
    pub fn is_hosted_by(&self, user_id: Uuid) -> bool {
        self.host.user_id == user_id
    }
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A subscription tier as reported by the billing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Team,
    Enterprise,
}

impl SubscriptionTier {
    /// Whether this tier includes live audio/video sessions.
    pub fn includes_live_sessions(self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionTier::Free),
            "pro" => Ok(SubscriptionTier::Pro),
            "team" => Ok(SubscriptionTier::Team),
            "enterprise" => Ok(SubscriptionTier::Enterprise),
            other => Err(format!("Unknown subscription tier: {}", other)),
        }
    }
}

/// An authenticated caller, as verified by the upstream auth gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The ID of the user.
    pub id: Uuid,
    /// The name shown to other participants.
    pub display_name: String,
    /// The organization the user belongs to.
    pub organization_id: Uuid,
    /// The user's subscription tier.
    pub subscription_tier: SubscriptionTier,
}

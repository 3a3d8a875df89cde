use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn is_premium(&self) -> bool {
        matches!(self, SubscriptionStatus::Premium)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "Free",
            SubscriptionStatus::Premium => "Premium",
        }
    }
}

/// Fresh account state as reported by the backend. Fetched per poll
/// tick and discarded, except for the tick that confirms activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatusSnapshot {
    pub company_id: String,
    pub company_name: String,
    pub subscription_status: SubscriptionStatus,
    pub logo_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl AccountStatusSnapshot {
    pub fn is_premium(&self) -> bool {
        self.subscription_status.is_premium()
    }
}

/// Partial update merged into the cached session after a confirmed
/// activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPatch {
    pub subscription_status: SubscriptionStatus,
    pub company_id: String,
    pub company_name: String,
    pub logo_url: Option<String>,
}

impl SessionPatch {
    pub fn from_snapshot(snapshot: &AccountStatusSnapshot) -> Self {
        Self {
            subscription_status: snapshot.subscription_status,
            company_id: snapshot.company_id.clone(),
            company_name: snapshot.company_name.clone(),
            logo_url: snapshot.logo_url.clone(),
        }
    }
}

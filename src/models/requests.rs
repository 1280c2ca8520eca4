use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::VirtualDateStatus;

/// Request to swipe on another user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub action: String,
}

/// Query string for listing matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListMatchesQuery {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_list_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

fn default_status() -> String {
    "matched".to_string()
}

fn default_page() -> u32 {
    1
}

fn default_list_limit() -> u32 {
    20
}

/// Query string for recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsQuery {
    #[serde(default)]
    pub limit: Option<u16>,
    /// Comma separated profile ids
    #[serde(default, rename = "excludeUserIds")]
    pub exclude_user_ids: Option<String>,
}

impl RecommendationsQuery {
    pub fn exclude_ids(&self) -> Vec<String> {
        self.exclude_user_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Request to schedule a virtual date
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleDateRequest {
    #[serde(rename = "scheduledAt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub activity: String,
}

/// Request to move a virtual date to a new status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDateStatusRequest {
    pub status: VirtualDateStatus,
}

/// Request to block another user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

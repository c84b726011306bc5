pub mod auth;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Permission, Role};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Authentication required")]
    pub error: String,
}

/// Body of a 401/403 from the permission guard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DenialResponse {
    #[schema(example = "Insufficient permissions")]
    pub error: String,
    #[schema(example = "insufficient_permission")]
    pub code: String,
    pub required: Option<Vec<Permission>>,
    pub user_role: Option<Role>,
}

/// Minimal body for the notice pages.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoticeResponse {
    pub notice: String,
    pub message: String,
    /// Where to start sign-in, carrying the preserved return target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_in_url: Option<String>,
}

impl NoticeResponse {
    pub fn new(notice: &str, message: &str) -> Self {
        Self {
            notice: notice.to_string(),
            message: message.to_string(),
            sign_in_url: None,
        }
    }

    pub fn with_sign_in_url(mut self, url: String) -> Self {
        self.sign_in_url = Some(url);
        self
    }
}

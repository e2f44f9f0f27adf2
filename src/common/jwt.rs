use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace roles. `Staff` is the internal back-office role.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Business,
    Influencer,
    Admin,
    Staff,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "business" => Role::Business,
            "influencer" => Role::Influencer,
            "admin" => Role::Admin,
            "staff" => Role::Staff,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Business => "business",
            Role::Influencer => "influencer",
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

/// Canonical identity attached to authenticated requests.
///
/// The auth backend stores users as camelCase documents; the only place that
/// shape is visible is `auth::services::auth_client`, which maps it into this
/// struct before anything else sees it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: u32,
}

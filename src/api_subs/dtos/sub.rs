use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api_subs::models::sub::{Subscription, SubscriptionPackage};

#[derive(Debug, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<SubscriptionPackage>,
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub package: SubscriptionPackage,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Subscription,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PackageUpsertRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub monthly_price: Option<i64>,
    #[serde(default)]
    pub setup_fee: i64,
    pub duration_months: i32,
    pub billing_cycle: String,
    pub payment_type: String,
    #[serde(default)]
    pub advance_payment_months: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub dashboard_sections: Vec<String>,
}

/// Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdateRequest {
    pub status: Option<String>,
    pub end_date: Option<NaiveDateTime>,
    pub actual_start_date: Option<NaiveDateTime>,
    pub recurring_amount: Option<i64>,
    pub next_billing_date: Option<NaiveDateTime>,
    pub is_pausable: Option<bool>,
    pub is_user_cancellable: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignSubscriptionRequest {
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub start_date: Option<NaiveDateTime>,
}

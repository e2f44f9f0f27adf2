use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::JsonValue;
use uuid::Uuid;

/// How a package is paid for. Stored as text in the database; unrecognized
/// values fall back to `Recurring` so a bad row can never look refund-exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentType {
    OneTime,
    Recurring,
}

impl PaymentType {
    pub fn parse(s: &str) -> Self {
        match s {
            "one-time" => PaymentType::OneTime,
            _ => PaymentType::Recurring,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::OneTime => "one-time",
            PaymentType::Recurring => "recurring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn parse(s: &str) -> Self {
        match s {
            "yearly" => BillingCycle::Yearly,
            _ => BillingCycle::Monthly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }

    /// Length of one billing cycle in months.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Paused => "paused",
        }
    }
}

/// A catalog entry. Immutable from the subscriber's perspective; mutated only
/// through the admin routes. Prices are integer INR; conversion to paise
/// happens at the gateway boundary.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SubscriptionPackage {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub monthly_price: Option<i64>,
    pub setup_fee: i64,
    pub duration_months: i32,
    pub billing_cycle: String,
    pub payment_type: String,
    pub advance_payment_months: i32,
    pub features: JsonValue,
    pub dashboard_sections: JsonValue,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SubscriptionPackage {
    pub fn kind(&self) -> PaymentType {
        PaymentType::parse(&self.payment_type)
    }

    pub fn cycle(&self) -> BillingCycle {
        BillingCycle::parse(&self.billing_cycle)
    }

    /// Per-month price for monthly-billed packages. Falls back to the full
    /// price for legacy rows that never set a monthly figure.
    pub fn monthly_price_or_default(&self) -> i64 {
        self.monthly_price.unwrap_or(self.price)
    }
}

/// One user's relationship to one package over time. Rows are only ever
/// status-transitioned, never deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub package_name: String,
    pub status: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub actual_start_date: Option<NaiveDateTime>,
    pub payment_type: String,
    pub billing_cycle: String,
    pub amount: i64,
    pub recurring_amount: i64,
    pub next_billing_date: Option<NaiveDateTime>,
    pub signup_fee: i64,
    pub is_pausable: bool,
    pub is_user_cancellable: bool,
    pub cancelled_at: Option<NaiveDateTime>,
    pub cancel_reason: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<NaiveDateTime>,
    pub invoice_ids: JsonValue,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Subscription {
    pub fn kind(&self) -> PaymentType {
        PaymentType::parse(&self.payment_type)
    }

    pub fn cycle(&self) -> BillingCycle {
        BillingCycle::parse(&self.billing_cycle)
    }

    pub fn is_paused(&self) -> bool {
        self.status == SubscriptionStatus::Paused.as_str()
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active.as_str()
    }

    /// Appends a gateway payment/order id to the invoice trail.
    pub fn push_invoice_id(&mut self, invoice_id: &str) {
        match self.invoice_ids.as_array_mut() {
            Some(ids) => ids.push(JsonValue::String(invoice_id.to_string())),
            None => {
                self.invoice_ids = serde_json::json!([invoice_id]);
            }
        }
    }
}

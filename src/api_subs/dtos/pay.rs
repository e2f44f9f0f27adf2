use serde::Deserialize;
use uuid::Uuid;

/// Prefill data for the checkout widget. Contact is optional; the widget
/// asks for it when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub package_id: Uuid,
    pub user_id: Uuid,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub use_one_time_preferred: bool,
    #[serde(default)]
    pub enable_auto_pay: bool,
}

/// Reported by the client after the widget's success handler fires. The two
/// preference flags echo what was sent to `/authorize`, so the stored record
/// matches what was actually charged.
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub package_id: Uuid,
    #[serde(default)]
    pub use_one_time_preferred: bool,
    #[serde(default)]
    pub enable_auto_pay: bool,
}

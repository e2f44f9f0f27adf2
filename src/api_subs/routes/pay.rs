use actix_web::{Responder, post, web};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api_subs::{
    dtos::{
        pay::{AuthorizeRequest, CaptureRequest},
        sub::SubscriptionResponse,
    },
    services,
};
use crate::common::{
    env_config::Config,
    error::Res,
    http::Success,
    jwt::Claims,
    razorpay::RazorpayClient,
};

fn gateway(config: &Config) -> RazorpayClient {
    RazorpayClient::new(
        &config.razorpay_api_base,
        &config.razorpay_key_id,
        &config.razorpay_key_secret,
    )
}

/// Authorizes a checkout attempt server-side.
///
/// The single source of truth for amounts: the package is loaded from the
/// catalog, the charge is computed here, a gateway order is created and the
/// complete widget-ready options object is returned. Clients open the widget
/// with this payload verbatim and never do their own amount math.
///
/// # Input
/// JSON body:
/// - `package_id`: catalog package to purchase
/// - `user_id`: the purchasing user
/// - `customer`: `{name, email, contact?}` prefill for the widget
/// - `use_one_time_preferred`: charge a recurring package in full, once
/// - `enable_auto_pay`: request a recurring token sized to the remaining amount
///
/// # Output
/// - Success: 200 with `{key, amount, currency, name, description, order_id,
///   prefill, notes, is_one_time, recurring_token?}` (amount in paise)
/// - Error: 400 unknown/retired package, 502 gateway failure
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/pay/authorize', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     package_id: pkg.id,
///     user_id: currentUser.id,
///     customer: { name: currentUser.name, email: currentUser.email },
///     enable_auto_pay: true
///   })
/// });
/// const options = await response.json();
/// new Razorpay(options).open(); // echo the server's payload, no client math
/// ```
#[post("/authorize")]
pub async fn post_authorize(
    req: web::Json<AuthorizeRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let client = gateway(&config);
    let options = services::pay::authorize_checkout(
        &pool,
        &client,
        req.package_id,
        req.user_id,
        &req.customer,
        req.use_one_time_preferred,
        req.enable_auto_pay,
    )
    .await?;

    Success::ok(options)
}

/// Records a successful widget payment for the authenticated user.
///
/// First payment for a package creates the subscription; a payment for the
/// user's already-active package is treated as a renewal. The gateway payment
/// id is appended to the record's invoice trail either way.
///
/// The preference flags must echo the authorize call. A recurring package
/// bought with `use_one_time_preferred` was charged the full package price,
/// so its record is stored as one-time: no billing schedule for the poller to
/// pick up, no second charge. Without `enable_auto_pay` there is no gateway
/// token, so the record is created outside the autopay schedule.
///
/// # Input
/// - `razorpay_order_id` / `razorpay_payment_id`: from the widget's handler
/// - `package_id`: the package that was paid for
/// - `use_one_time_preferred`: the package was charged in full, once
/// - `enable_auto_pay`: whether the user opted into autopay at checkout
///
/// # Output
/// - Success: 201 with `{ "subscription": {...} }`
/// - Error: 400 unknown package, 500 on write failure
#[post("/capture")]
pub async fn post_capture(
    claims: web::ReqData<Claims>,
    req: web::Json<CaptureRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    log::info!(
        "Capture reported: order={} payment={} user={} autopay={}",
        req.razorpay_order_id,
        req.razorpay_payment_id,
        claims.user_id,
        req.enable_auto_pay
    );

    let existing = services::sub::get_active_user_subscription(&pool, claims.user_id).await?;

    let subscription = match existing {
        Some(current) if current.package_id == req.package_id => {
            services::sub::renew_subscription(&pool, current.id, &req.razorpay_payment_id).await?
        }
        _ => {
            let pkg = services::package::get_active_package(&pool, req.package_id).await?;
            let mut sub = services::sub::build_subscription(
                &pkg,
                claims.user_id,
                chrono::Utc::now().naive_utc(),
                req.use_one_time_preferred,
                req.enable_auto_pay,
            );
            sub.push_invoice_id(&req.razorpay_payment_id);
            services::sub::create_subscription(&pool, sub).await?
        }
    };

    Success::created(SubscriptionResponse { subscription })
}

use actix_web::{Responder, get, post, web};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api_subs::{
    dtos::sub::{CancelRequest, PackageListResponse, SubscriptionResponse},
    services,
};
use crate::common::{
    error::{AppError, Res},
    http::Success,
    jwt::Claims,
};

/// Retrieves the public package catalog (active packages only).
///
/// # Output
/// - Success: 200 with `{ "packages": [...] }`, cheapest first
/// - Error: 500 if the catalog cannot be read
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/sub/packages');
/// if (response.ok) {
///   const { packages } = await response.json();
///   // [{ id, title, price, setup_fee, billing_cycle, payment_type, features, ... }]
/// }
/// ```
#[get("/packages")]
pub async fn get_packages(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let packages = services::package::list_active_packages(&pool).await?;
    Success::ok(PackageListResponse { packages })
}

/// Retrieves the authenticated user's active subscription.
///
/// # Output
/// - Success: 200 with `{ "subscription": {...} }`
/// - Error: 404 Not Found if the user has no active subscription
#[get("/current")]
pub async fn get_current(
    claims: web::ReqData<Claims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let subscription = services::sub::get_active_user_subscription(&pool, claims.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    Success::ok(SubscriptionResponse { subscription })
}

/// Cancels the authenticated user's active subscription.
///
/// Refused with 403 when the subscription was bought as a one-time payment
/// or is flagged non-cancellable; cancellation would make it look
/// refund-eligible downstream.
///
/// # Input
/// - `reason`: optional free-text reason stored on the record
#[post("/cancel")]
pub async fn post_cancel(
    claims: web::ReqData<Claims>,
    req: web::Json<CancelRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let subscription = services::sub::get_active_user_subscription(&pool, claims.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    let reason = req
        .reason
        .clone()
        .unwrap_or_else(|| "user requested".to_string());
    let cancelled = services::sub::cancel_subscription(&pool, subscription.id, &reason).await?;

    Success::ok(SubscriptionResponse {
        subscription: cancelled,
    })
}

/// Pauses the authenticated user's active subscription, when pausable.
#[post("/pause")]
pub async fn post_pause(
    claims: web::ReqData<Claims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let subscription = services::sub::get_active_user_subscription(&pool, claims.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    let paused = services::sub::pause_subscription(&pool, subscription.id).await?;
    Success::ok(SubscriptionResponse {
        subscription: paused,
    })
}

/// Resumes the authenticated user's paused subscription.
#[post("/resume")]
pub async fn post_resume(
    claims: web::ReqData<Claims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let paused = services::sub::get_paused_user_subscription(&pool, claims.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No paused subscription found".to_string()))?;

    let resumed = services::sub::resume_subscription(&pool, paused.id).await?;
    Success::ok(SubscriptionResponse {
        subscription: resumed,
    })
}

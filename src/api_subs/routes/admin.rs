use actix_web::{Responder, post, put, web};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api_subs::{
    dtos::sub::{
        AssignSubscriptionRequest, PackageResponse, PackageUpsertRequest,
        SubscriptionResponse, SubscriptionUpdateRequest,
    },
    services,
};
use crate::common::{
    error::{AppError, Res},
    http::Success,
    jwt::{Claims, Role},
};

fn require_admin(claims: &Claims) -> Res<()> {
    if claims.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Admin role required for this operation".to_string(),
        ));
    }
    Ok(())
}

/// Creates a catalog package. Admin only.
#[post("/packages")]
pub async fn post_package(
    claims: web::ReqData<Claims>,
    req: web::Json<PackageUpsertRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_admin(&claims)?;

    let package = services::package::create_package(&pool, &req).await?;
    log::info!("Admin {} created package {}", claims.user_id, package.id);
    Success::created(PackageResponse { package })
}

/// Updates a catalog package. Admin only. Existing subscriptions keep the
/// terms they were sold under; only future checkouts see the new fields.
#[put("/packages/{id}")]
pub async fn put_package(
    claims: web::ReqData<Claims>,
    path: web::Path<uuid::Uuid>,
    req: web::Json<PackageUpsertRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_admin(&claims)?;

    let package = services::package::update_package(&pool, path.into_inner(), &req).await?;
    Success::ok(PackageResponse { package })
}

/// Retires a catalog package. Admin only. Packages are never deleted because
/// subscription rows soft-reference them.
#[post("/packages/{id}/deactivate")]
pub async fn post_deactivate_package(
    claims: web::ReqData<Claims>,
    path: web::Path<uuid::Uuid>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_admin(&claims)?;

    let package = services::package::deactivate_package(&pool, path.into_inner()).await?;
    log::info!("Admin {} deactivated package {}", claims.user_id, package.id);
    Success::ok(PackageResponse { package })
}

/// Patches a subscription record. Admin only. Absent fields are untouched,
/// and the one-time normalization still applies: a one-time record cannot be
/// made pausable or user-cancellable through this route.
#[put("/subscriptions/{id}")]
pub async fn put_subscription(
    claims: web::ReqData<Claims>,
    path: web::Path<uuid::Uuid>,
    req: web::Json<SubscriptionUpdateRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_admin(&claims)?;

    let req = req.into_inner();
    let patch = services::sub::SubscriptionPatch {
        status: req.status,
        end_date: req.end_date,
        actual_start_date: req.actual_start_date,
        recurring_amount: req.recurring_amount,
        next_billing_date: req.next_billing_date,
        is_pausable: req.is_pausable,
        is_user_cancellable: req.is_user_cancellable,
    };
    let subscription =
        services::sub::update_subscription(&pool, path.into_inner(), patch).await?;

    log::info!(
        "Admin {} updated subscription {}",
        claims.user_id,
        subscription.id
    );
    Success::ok(SubscriptionResponse { subscription })
}

/// Assigns a subscription to a user without a payment, optionally starting
/// in the future. Admin only.
///
/// The assignment goes through the same normalization as paid checkouts: a
/// one-time package assigned here is still non-pausable and
/// non-user-cancellable.
#[post("/subscriptions/assign")]
pub async fn post_assign_subscription(
    claims: web::ReqData<Claims>,
    req: web::Json<AssignSubscriptionRequest>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_admin(&claims)?;

    let pkg = services::package::get_active_package(&pool, req.package_id).await?;
    let subscription = services::sub::assign_subscription(
        &pool,
        &pkg,
        req.user_id,
        claims.user_id,
        req.start_date,
    )
    .await?;

    log::info!(
        "Admin {} assigned package {} to user {}",
        claims.user_id,
        pkg.id,
        req.user_id
    );
    Success::created(SubscriptionResponse { subscription })
}

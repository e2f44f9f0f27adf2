//! Package catalog store. Read by every subscription flow, mutated only by
//! the admin routes; packages are deactivated rather than deleted so existing
//! subscription rows keep a valid soft reference.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api_subs::dtos::sub::PackageUpsertRequest;
use crate::api_subs::models::sub::SubscriptionPackage;
use crate::common::error::{AppError, Res};

pub async fn list_active_packages(pool: &PgPool) -> Res<Vec<SubscriptionPackage>> {
    sqlx::query_as::<_, SubscriptionPackage>(
        "SELECT * FROM subscription_packages WHERE active = TRUE ORDER BY price ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

pub async fn get_package(pool: &PgPool, id: Uuid) -> Res<SubscriptionPackage> {
    sqlx::query_as::<_, SubscriptionPackage>("SELECT * FROM subscription_packages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Package {} not found", id)))
}

/// Like [`get_package`] but refuses deactivated entries; used by checkout
/// paths so retired plans cannot be purchased.
pub async fn get_active_package(pool: &PgPool, id: Uuid) -> Res<SubscriptionPackage> {
    let pkg = get_package(pool, id).await?;
    if !pkg.active {
        return Err(AppError::BadRequest(format!(
            "Package {} is no longer available",
            id
        )));
    }
    Ok(pkg)
}

/// Rejects unknown billing terms up front. The `parse` fallbacks in the model
/// exist for legacy rows; letting a typo like "onetime" through here would
/// silently store a cancellable recurring package.
fn validate_terms(req: &PackageUpsertRequest) -> Res<()> {
    if !matches!(req.billing_cycle.as_str(), "monthly" | "yearly") {
        return Err(AppError::BadRequest(format!(
            "Unknown billing cycle: {}",
            req.billing_cycle
        )));
    }
    if !matches!(req.payment_type.as_str(), "one-time" | "recurring") {
        return Err(AppError::BadRequest(format!(
            "Unknown payment type: {}",
            req.payment_type
        )));
    }
    Ok(())
}

pub async fn create_package(
    pool: &PgPool,
    req: &PackageUpsertRequest,
) -> Res<SubscriptionPackage> {
    validate_terms(req)?;

    sqlx::query_as::<_, SubscriptionPackage>(
        r#"
        INSERT INTO subscription_packages (
            id, title, description, price, monthly_price, setup_fee,
            duration_months, billing_cycle, payment_type, advance_payment_months,
            features, dashboard_sections, active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.title)
    .bind(req.description.as_deref().unwrap_or(""))
    .bind(req.price)
    .bind(req.monthly_price)
    .bind(req.setup_fee)
    .bind(req.duration_months)
    .bind(&req.billing_cycle)
    .bind(&req.payment_type)
    .bind(req.advance_payment_months)
    .bind(serde_json::json!(req.features))
    .bind(serde_json::json!(req.dashboard_sections))
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update_package(
    pool: &PgPool,
    id: Uuid,
    req: &PackageUpsertRequest,
) -> Res<SubscriptionPackage> {
    validate_terms(req)?;

    sqlx::query_as::<_, SubscriptionPackage>(
        r#"
        UPDATE subscription_packages SET
            title = $2, description = $3, price = $4, monthly_price = $5,
            setup_fee = $6, duration_months = $7, billing_cycle = $8,
            payment_type = $9, advance_payment_months = $10,
            features = $11, dashboard_sections = $12, updated_at = $13
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&req.title)
    .bind(req.description.as_deref().unwrap_or(""))
    .bind(req.price)
    .bind(req.monthly_price)
    .bind(req.setup_fee)
    .bind(req.duration_months)
    .bind(&req.billing_cycle)
    .bind(&req.payment_type)
    .bind(req.advance_payment_months)
    .bind(serde_json::json!(req.features))
    .bind(serde_json::json!(req.dashboard_sections))
    .bind(Utc::now().naive_utc())
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::NotFound(format!("Package {} not found", id)))
}

pub async fn deactivate_package(pool: &PgPool, id: Uuid) -> Res<SubscriptionPackage> {
    sqlx::query_as::<_, SubscriptionPackage>(
        "UPDATE subscription_packages SET active = FALSE, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::NotFound(format!("Package {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(payment_type: &str, billing_cycle: &str) -> PackageUpsertRequest {
        PackageUpsertRequest {
            title: "Growth".to_string(),
            description: None,
            price: 1000,
            monthly_price: None,
            setup_fee: 200,
            duration_months: 12,
            billing_cycle: billing_cycle.to_string(),
            payment_type: payment_type.to_string(),
            advance_payment_months: 0,
            features: vec![],
            dashboard_sections: vec![],
        }
    }

    #[test]
    fn known_terms_pass_validation() {
        assert!(validate_terms(&upsert("one-time", "monthly")).is_ok());
        assert!(validate_terms(&upsert("recurring", "yearly")).is_ok());
    }

    #[test]
    fn unknown_billing_cycle_is_rejected() {
        assert!(validate_terms(&upsert("recurring", "weekly")).is_err());
    }

    #[test]
    fn misspelled_payment_type_is_rejected() {
        // "onetime" would otherwise parse as recurring and stay cancellable
        assert!(validate_terms(&upsert("onetime", "monthly")).is_err());
    }
}

//! Subscription record store.
//!
//! All writes to `user_subscriptions` funnel through this module so the
//! refund-prevention invariant (one-time payments are never pausable or
//! user-cancellable) holds on every path, the admin assignment path
//! included.

use chrono::{Months, NaiveDateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api_subs::models::sub::{
    PaymentType, Subscription, SubscriptionPackage, SubscriptionStatus,
};
use crate::api_subs::services::pay;
use crate::common::error::{AppError, Res};
use crate::db;

/// The refund-prevention invariant: a one-time payment must not be pausable
/// or user-cancellable, no matter what flags a caller asked for.
pub fn normalize_refund_flags(
    kind: PaymentType,
    is_pausable: bool,
    is_user_cancellable: bool,
) -> (bool, bool) {
    match kind {
        PaymentType::OneTime => (false, false),
        PaymentType::Recurring => (is_pausable, is_user_cancellable),
    }
}

/// Guard for user-initiated cancellation. Refusal is an error, never a
/// silent no-op.
pub fn ensure_user_cancellable(kind: PaymentType, is_user_cancellable: bool) -> Res<()> {
    if kind == PaymentType::OneTime {
        return Err(AppError::Forbidden(
            "One-time payment subscriptions cannot be cancelled".to_string(),
        ));
    }
    if !is_user_cancellable {
        return Err(AppError::Forbidden(
            "This subscription is not user-cancellable".to_string(),
        ));
    }
    Ok(())
}

/// Months of service covered by the initial payment; the first recurring
/// charge falls due right after them.
fn prepaid_months(pkg: &SubscriptionPackage) -> u32 {
    match pkg.cycle().months() {
        1 => pkg.advance_payment_months.max(0) as u32,
        _ => {
            if pkg.advance_payment_months > 0 {
                12
            } else {
                0
            }
        }
    }
}

/// Constructs the in-memory record for a fresh subscription to `pkg`,
/// normalized and priced but not yet persisted.
///
/// `one_time_preferred` buys a recurring package in full up front: the record
/// is stored as one-time (full price as the amount, no billing schedule,
/// locked flags) so it can never be charged again. `enable_auto_pay` controls
/// whether a recurring record enters the billing schedule at all; without a
/// gateway token the poller has nothing to charge, so renewals for such
/// records are user-initiated.
pub fn build_subscription(
    pkg: &SubscriptionPackage,
    user_id: Uuid,
    start_date: NaiveDateTime,
    one_time_preferred: bool,
    enable_auto_pay: bool,
) -> Subscription {
    let kind = if one_time_preferred {
        PaymentType::OneTime
    } else {
        pkg.kind()
    };

    let end_date = start_date
        .checked_add_months(Months::new(pkg.duration_months.max(0) as u32))
        .unwrap_or(start_date);

    let next_billing_date = match kind {
        PaymentType::OneTime => None,
        PaymentType::Recurring if !enable_auto_pay => None,
        PaymentType::Recurring => Some(
            start_date
                .checked_add_months(Months::new(prepaid_months(pkg)))
                .unwrap_or(start_date),
        ),
    };

    let (is_pausable, is_user_cancellable) = normalize_refund_flags(kind, true, true);

    let now = Utc::now().naive_utc();
    Subscription {
        id: Uuid::new_v4(),
        user_id,
        package_id: pkg.id,
        package_name: pkg.title.clone(),
        status: SubscriptionStatus::Active.as_str().to_string(),
        start_date,
        end_date,
        actual_start_date: None,
        payment_type: kind.as_str().to_string(),
        billing_cycle: pkg.billing_cycle.clone(),
        amount: match kind {
            PaymentType::OneTime => pay::calculate_total_package_price(pkg),
            PaymentType::Recurring => pay::calculate_initial_payment(pkg, true),
        },
        recurring_amount: match kind {
            PaymentType::OneTime => 0,
            PaymentType::Recurring => pay::calculate_recurring_payment_amount(pkg),
        },
        next_billing_date,
        signup_fee: pkg.setup_fee,
        is_pausable,
        is_user_cancellable,
        cancelled_at: None,
        cancel_reason: None,
        assigned_by: None,
        assigned_at: None,
        invoice_ids: serde_json::json!([]),
        created_at: now,
        updated_at: now,
    }
}

/// Inserts a subscription row. Re-applies the refund-flag normalization, then
/// best-effort updates the denormalized pointer on the user row: a failure
/// there is logged, not propagated, since the subscription itself committed.
pub async fn create_subscription(pool: &PgPool, mut sub: Subscription) -> Res<Subscription> {
    let (is_pausable, is_user_cancellable) =
        normalize_refund_flags(sub.kind(), sub.is_pausable, sub.is_user_cancellable);
    sub.is_pausable = is_pausable;
    sub.is_user_cancellable = is_user_cancellable;

    let created = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO user_subscriptions (
            id, user_id, package_id, package_name, status,
            start_date, end_date, actual_start_date, payment_type, billing_cycle,
            amount, recurring_amount, next_billing_date, signup_fee,
            is_pausable, is_user_cancellable, cancelled_at, cancel_reason,
            assigned_by, assigned_at, invoice_ids
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        RETURNING *
        "#,
    )
    .bind(sub.id)
    .bind(sub.user_id)
    .bind(sub.package_id)
    .bind(&sub.package_name)
    .bind(&sub.status)
    .bind(sub.start_date)
    .bind(sub.end_date)
    .bind(sub.actual_start_date)
    .bind(&sub.payment_type)
    .bind(&sub.billing_cycle)
    .bind(sub.amount)
    .bind(sub.recurring_amount)
    .bind(sub.next_billing_date)
    .bind(sub.signup_fee)
    .bind(sub.is_pausable)
    .bind(sub.is_user_cancellable)
    .bind(sub.cancelled_at)
    .bind(&sub.cancel_reason)
    .bind(sub.assigned_by)
    .bind(sub.assigned_at)
    .bind(&sub.invoice_ids)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)?;

    if let Err(e) = db::user::update_subscription_pointer(pool, &created).await {
        log::warn!(
            "Failed to update subscription pointer for user {}: {}",
            created.user_id,
            e
        );
    }

    Ok(created)
}

/// The user's active subscription, if any. `None` means no active row exists;
/// a query failure is an `Err`, never silently `None`.
pub async fn get_active_user_subscription(
    pool: &PgPool,
    user_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM user_subscriptions WHERE user_id = $1 AND status = 'active'
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

/// The user's paused subscription, if any; the resume flow starts here since
/// a paused row no longer matches the active lookup.
pub async fn get_paused_user_subscription(
    pool: &PgPool,
    user_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM user_subscriptions WHERE user_id = $1 AND status = 'paused'
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn get_subscription(pool: &PgPool, id: Uuid) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM user_subscriptions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Subscription {} not found", id)))
}

/// Persists the mutable columns of an in-memory record.
async fn persist(pool: &PgPool, sub: &Subscription) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE user_subscriptions SET
            status = $2, end_date = $3, actual_start_date = $4,
            recurring_amount = $5, next_billing_date = $6,
            is_pausable = $7, is_user_cancellable = $8,
            cancelled_at = $9, cancel_reason = $10, invoice_ids = $11,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(sub.id)
    .bind(&sub.status)
    .bind(sub.end_date)
    .bind(sub.actual_start_date)
    .bind(sub.recurring_amount)
    .bind(sub.next_billing_date)
    .bind(sub.is_pausable)
    .bind(sub.is_user_cancellable)
    .bind(sub.cancelled_at)
    .bind(&sub.cancel_reason)
    .bind(&sub.invoice_ids)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

/// Patch for `update_subscription`. Absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionPatch {
    pub status: Option<String>,
    pub end_date: Option<NaiveDateTime>,
    pub actual_start_date: Option<NaiveDateTime>,
    pub recurring_amount: Option<i64>,
    pub next_billing_date: Option<NaiveDateTime>,
    pub is_pausable: Option<bool>,
    pub is_user_cancellable: Option<bool>,
}

/// Applies a patch in memory. The refund-flag normalization runs on every
/// application, so a caller cannot re-enable cancellation on a one-time
/// record.
pub fn apply_patch(sub: &mut Subscription, patch: SubscriptionPatch) {
    if let Some(status) = patch.status {
        sub.status = status;
    }
    if let Some(end_date) = patch.end_date {
        sub.end_date = end_date;
    }
    if let Some(actual_start_date) = patch.actual_start_date {
        sub.actual_start_date = Some(actual_start_date);
    }
    if let Some(recurring_amount) = patch.recurring_amount {
        sub.recurring_amount = recurring_amount;
    }
    if let Some(next_billing_date) = patch.next_billing_date {
        sub.next_billing_date = Some(next_billing_date);
    }
    if let Some(is_pausable) = patch.is_pausable {
        sub.is_pausable = is_pausable;
    }
    if let Some(is_user_cancellable) = patch.is_user_cancellable {
        sub.is_user_cancellable = is_user_cancellable;
    }

    let (is_pausable, is_user_cancellable) =
        normalize_refund_flags(sub.kind(), sub.is_pausable, sub.is_user_cancellable);
    sub.is_pausable = is_pausable;
    sub.is_user_cancellable = is_user_cancellable;
}

/// Applies a patch and persists it.
pub async fn update_subscription(
    pool: &PgPool,
    id: Uuid,
    patch: SubscriptionPatch,
) -> Res<Subscription> {
    if let Some(status) = patch.status.as_deref() {
        if !matches!(status, "active" | "cancelled" | "paused") {
            return Err(AppError::BadRequest(format!(
                "Unknown subscription status: {}",
                status
            )));
        }
    }

    let mut sub = get_subscription(pool, id).await?;
    apply_patch(&mut sub, patch);

    let updated = persist(pool, &sub).await?;

    if let Err(e) = db::user::update_subscription_pointer(pool, &updated).await {
        log::warn!(
            "Failed to update subscription pointer for user {}: {}",
            updated.user_id,
            e
        );
    }

    Ok(updated)
}

/// User-initiated cancellation. Reads payment type and cancellability first
/// and refuses one-time or non-cancellable records.
pub async fn cancel_subscription(pool: &PgPool, id: Uuid, reason: &str) -> Res<Subscription> {
    let mut sub = get_subscription(pool, id).await?;

    ensure_user_cancellable(sub.kind(), sub.is_user_cancellable)?;

    sub.status = SubscriptionStatus::Cancelled.as_str().to_string();
    sub.cancelled_at = Some(Utc::now().naive_utc());
    sub.cancel_reason = Some(reason.to_string());
    sub.next_billing_date = None;

    let cancelled = persist(pool, &sub).await?;
    log::info!("Subscription {} cancelled: {}", id, reason);

    if let Err(e) = db::user::update_subscription_pointer(pool, &cancelled).await {
        log::warn!(
            "Failed to update subscription pointer for user {}: {}",
            cancelled.user_id,
            e
        );
    }

    Ok(cancelled)
}

pub async fn pause_subscription(pool: &PgPool, id: Uuid) -> Res<Subscription> {
    let mut sub = get_subscription(pool, id).await?;

    if !sub.is_pausable {
        return Err(AppError::Forbidden(
            "This subscription cannot be paused".to_string(),
        ));
    }
    if !sub.is_active() {
        return Err(AppError::BadRequest(format!(
            "Only active subscriptions can be paused (current status: {})",
            sub.status
        )));
    }

    sub.status = SubscriptionStatus::Paused.as_str().to_string();
    persist(pool, &sub).await
}

pub async fn resume_subscription(pool: &PgPool, id: Uuid) -> Res<Subscription> {
    let mut sub = get_subscription(pool, id).await?;

    if !sub.is_paused() {
        return Err(AppError::BadRequest(format!(
            "Only paused subscriptions can be resumed (current status: {})",
            sub.status
        )));
    }

    sub.status = SubscriptionStatus::Active.as_str().to_string();
    persist(pool, &sub).await
}

/// Admin-assigned subscription, optionally starting in the future. Runs the
/// same normalization as every other write path, so an assigned one-time
/// package still ends up non-pausable and non-cancellable.
pub async fn assign_subscription(
    pool: &PgPool,
    pkg: &SubscriptionPackage,
    user_id: Uuid,
    admin_id: Uuid,
    start_date: Option<NaiveDateTime>,
) -> Res<Subscription> {
    let now = Utc::now().naive_utc();
    let start = start_date.unwrap_or(now);

    let mut sub = build_subscription(pkg, user_id, start, false, true);
    if start > now {
        sub.actual_start_date = Some(start);
    }
    sub.assigned_by = Some(admin_id);
    sub.assigned_at = Some(now);

    create_subscription(pool, sub).await
}

/// Records a successful renewal: appends the gateway invoice id and advances
/// the next billing date by one cycle.
pub async fn renew_subscription(pool: &PgPool, id: Uuid, invoice_id: &str) -> Res<Subscription> {
    let mut sub = get_subscription(pool, id).await?;

    sub.push_invoice_id(invoice_id);
    if let Some(due) = sub.next_billing_date {
        sub.next_billing_date = Some(
            due.checked_add_months(Months::new(sub.cycle().months()))
                .unwrap_or(due),
        );
    }

    let renewed = persist(pool, &sub).await?;
    log::info!(
        "Subscription {} renewed, next billing {:?}",
        id,
        renewed.next_billing_date
    );
    Ok(renewed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn package(payment_type: &str) -> SubscriptionPackage {
        let now = Utc::now().naive_utc();
        SubscriptionPackage {
            id: Uuid::new_v4(),
            title: "Starter".to_string(),
            description: String::new(),
            price: 1000,
            monthly_price: Some(100),
            setup_fee: 200,
            duration_months: 12,
            billing_cycle: "monthly".to_string(),
            payment_type: payment_type.to_string(),
            advance_payment_months: 1,
            features: serde_json::json!([]),
            dashboard_sections: serde_json::json!([]),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn one_time_flags_are_forced_off() {
        assert_eq!(
            normalize_refund_flags(PaymentType::OneTime, true, true),
            (false, false)
        );
        assert_eq!(
            normalize_refund_flags(PaymentType::Recurring, true, false),
            (true, false)
        );
    }

    #[test]
    fn built_one_time_subscription_is_locked_down() {
        let pkg = package("one-time");
        let sub = build_subscription(&pkg, Uuid::new_v4(), Utc::now().naive_utc(), false, true);
        assert!(!sub.is_pausable);
        assert!(!sub.is_user_cancellable);
        assert!(sub.next_billing_date.is_none());
        assert_eq!(sub.amount, 1200);
    }

    #[test]
    fn built_recurring_subscription_bills_after_advance() {
        let pkg = package("recurring");
        let start = Utc::now().naive_utc();
        let sub = build_subscription(&pkg, Uuid::new_v4(), start, false, true);
        assert!(sub.is_pausable);
        assert!(sub.is_user_cancellable);
        assert_eq!(
            sub.next_billing_date,
            Some(start.checked_add_months(Months::new(1)).unwrap())
        );
        assert_eq!(sub.recurring_amount, 100);
    }

    #[test]
    fn one_time_preference_prepays_recurring_package_in_full() {
        let mut pkg = package("recurring");
        pkg.billing_cycle = "yearly".to_string();
        pkg.advance_payment_months = 0;

        let sub = build_subscription(&pkg, Uuid::new_v4(), Utc::now().naive_utc(), true, true);

        // the record carries the same figure the checkout was charged
        assert_eq!(sub.amount, pay::calculate_total_package_price(&pkg));
        assert_eq!(sub.amount, 1200);
        assert_eq!(sub.payment_type, "one-time");
        assert_eq!(sub.recurring_amount, 0);
        assert!(sub.next_billing_date.is_none());
        assert!(!sub.is_pausable);
        assert!(!sub.is_user_cancellable);
    }

    #[test]
    fn recurring_without_autopay_has_no_billing_schedule() {
        let pkg = package("recurring");
        let sub = build_subscription(&pkg, Uuid::new_v4(), Utc::now().naive_utc(), false, false);
        assert_eq!(sub.payment_type, "recurring");
        assert!(sub.next_billing_date.is_none());
    }

    #[test]
    fn patch_cannot_reenable_flags_on_one_time_records() {
        let pkg = package("one-time");
        let mut sub = build_subscription(&pkg, Uuid::new_v4(), Utc::now().naive_utc(), false, true);

        apply_patch(
            &mut sub,
            SubscriptionPatch {
                is_pausable: Some(true),
                is_user_cancellable: Some(true),
                recurring_amount: Some(500),
                ..Default::default()
            },
        );

        assert!(!sub.is_pausable);
        assert!(!sub.is_user_cancellable);
        assert_eq!(sub.recurring_amount, 500);
    }

    #[test]
    fn cancel_guard_refuses_one_time_and_locked_records() {
        assert!(ensure_user_cancellable(PaymentType::OneTime, true).is_err());
        assert!(ensure_user_cancellable(PaymentType::OneTime, false).is_err());
        assert!(ensure_user_cancellable(PaymentType::Recurring, false).is_err());
        assert!(ensure_user_cancellable(PaymentType::Recurring, true).is_ok());
    }

    #[test]
    fn invoice_trail_appends() {
        let pkg = package("recurring");
        let mut sub = build_subscription(&pkg, Uuid::new_v4(), Utc::now().naive_utc(), false, true);
        sub.push_invoice_id("pay_1");
        sub.push_invoice_id("pay_2");
        assert_eq!(sub.invoice_ids, serde_json::json!(["pay_1", "pay_2"]));
    }
}

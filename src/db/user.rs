use sqlx::PgPool;

use crate::api_subs::models::sub::Subscription;
use crate::common::error::{AppError, Res};

/// Refreshes the denormalized subscription pointer columns on the user row.
/// Callers treat a failure here as non-fatal: the subscription row is the
/// source of truth, the pointer is a read-path convenience.
pub async fn update_subscription_pointer(pool: &PgPool, sub: &Subscription) -> Res<()> {
    sqlx::query(
        r#"
        UPDATE users SET
            active_subscription_id = $2,
            subscription_status = $3,
            subscription_package_name = $4,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(sub.user_id)
    .bind(if sub.is_active() { Some(sub.id) } else { None })
    .bind(&sub.status)
    .bind(&sub.package_name)
    .execute(pool)
    .await
    .map_err(AppError::from)?;

    Ok(())
}

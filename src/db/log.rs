use sqlx::PgPool;

use crate::common::error::{AppError, Res};
use crate::db::models::log::Log;

pub async fn insert_log(pool: &PgPool, log: Log) -> Res<()> {
    sqlx::query(
        "INSERT INTO logs (timestamp, method, path, status_code, user_id, params, ip_address, user_agent)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(log.timestamp)
    .bind(&log.method)
    .bind(&log.path)
    .bind(log.status_code)
    .bind(log.user_id)
    .bind(log.params)
    .bind(log.ip_address)
    .bind(&log.user_agent)
    .execute(pool)
    .await
    .map_err(AppError::from)?;

    Ok(())
}

//! # Logger Middleware Module
//!
//! Middleware that logs every HTTP request and response: method, path, query
//! parameters, status code, latency, the authenticated user (when a token is
//! present) and client information (IP address, user agent). Entries go to
//! the console (if enabled) and to the `logs` table for later analysis.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use actix_web::web;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use chrono::Utc;
use colored::Colorize;
use futures::future::{LocalBoxFuture, Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};
use log::info;
use sqlx::PgPool;
use sqlx::types::ipnetwork::IpNetwork;
use uuid::Uuid;

use crate::common::jwt::Claims;
use crate::db::models::log::Log;

pub struct LoggerMiddleware {
    console_logging_enabled: bool,
    jwt_secret: String,
}

impl LoggerMiddleware {
    pub fn new(console_logging_enabled: bool, jwt_secret: String) -> Self {
        Self {
            console_logging_enabled,
            jwt_secret,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
            console_logging_enabled: self.console_logging_enabled,
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
    console_logging_enabled: bool,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let pool = req
            .app_data::<web::Data<Arc<PgPool>>>()
            .map(|data| data.get_ref().clone());

        let method = req.method().to_string();
        let path = req.path().to_string();
        let query_string = req.query_string().to_string();
        let user_agent = req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let ip_address = req
            .peer_addr()
            .map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        // best-effort attribution: a bad or absent token just logs as anonymous
        let user_id = extract_user_id_from_token(&req, &self.jwt_secret);

        let console_logging_enabled = self.console_logging_enabled;
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let started = std::time::Instant::now();
            let res = srv.call(req).await?;
            let status = res.status();
            let elapsed = started.elapsed();

            if console_logging_enabled {
                let status_str = if status.is_success() {
                    status.as_u16().to_string().green()
                } else if status.is_client_error() {
                    status.as_u16().to_string().yellow()
                } else {
                    status.as_u16().to_string().red()
                };
                info!(
                    "{} {} {} ({:?})",
                    method.to_uppercase().cyan(),
                    path.bright_white(),
                    status_str,
                    elapsed
                );
            }

            if let Some(pool) = pool {
                let entry = Log {
                    id: Uuid::nil(), // auto-generated
                    timestamp: Utc::now().naive_utc(),
                    method,
                    path,
                    status_code: status.as_u16() as i32,
                    user_id,
                    params: parse_query_params(&query_string),
                    ip_address: IpNetwork::from(ip_address),
                    user_agent,
                };
                if let Err(e) = crate::db::log::insert_log(&pool, entry).await {
                    log::debug!("Failed to persist request log: {}", e);
                }
            }

            Ok(res)
        })
    }
}

/// Decodes the bearer token (if any) just enough to attribute the log entry.
/// Authorization decisions are the auth middleware's job, not ours.
fn extract_user_id_from_token(req: &ServiceRequest, secret: &str) -> Option<Uuid> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.user_id)
}

fn parse_query_params(query_string: &str) -> Option<serde_json::Value> {
    if query_string.is_empty() {
        return None;
    }
    let map: serde_json::Map<String, serde_json::Value> =
        url::form_urlencoded::parse(query_string.as_bytes())
            .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
            .collect();
    Some(serde_json::Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_parse_into_a_map() {
        let params = parse_query_params("package=growth&cycle=monthly").unwrap();
        assert_eq!(params["package"], "growth");
        assert_eq!(params["cycle"], "monthly");
    }

    #[test]
    fn empty_query_string_is_not_logged() {
        assert!(parse_query_params("").is_none());
    }

    #[test]
    fn token_attribution_uses_the_configured_secret() {
        use crate::common::jwt::Role;
        use jsonwebtoken::{EncodingKey, Header, encode};

        let user_id = Uuid::new_v4();
        let claims = Claims {
            user_id,
            email: "user@example.com".to_string(),
            role: Role::User,
            exp: u32::MAX,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_srv_request();

        assert_eq!(extract_user_id_from_token(&req, "s3cret"), Some(user_id));
        assert_eq!(extract_user_id_from_token(&req, "wrong"), None);
    }
}

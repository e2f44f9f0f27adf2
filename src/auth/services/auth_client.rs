// auth_client.rs (client for the external auth/user service)
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::{AppError, Res};
use crate::common::jwt::{Claims, Role};

#[derive(Debug, Serialize)]
pub struct TokenValidationRequest {
    pub token: String,
}

/// The user document as the auth backend stores it: camelCase fields. This
/// shape exists only inside this file; everything downstream works with the
/// canonical [`Claims`] it is mapped into.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteUserDocument {
    user_id: Uuid,
    email: String,
    role: String,
    #[allow(dead_code)]
    instagram_handle: Option<String>,
    exp: u32,
}

impl From<RemoteUserDocument> for Claims {
    fn from(doc: RemoteUserDocument) -> Self {
        Claims {
            user_id: doc.user_id,
            email: doc.email,
            role: Role::parse(&doc.role),
            exp: doc.exp,
        }
    }
}

pub struct AuthClient {
    client: Client,
    auth_service_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(auth_service_url: String, api_key: String) -> Self {
        AuthClient {
            client: Client::new(),
            auth_service_url,
            api_key,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Res<Claims> {
        let request_body = TokenValidationRequest {
            token: token.to_string(),
        };

        let response = self
            .client
            .post(format!(
                "{}/validate/validate-token",
                self.auth_service_url
            ))
            .json(&request_body)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let error_response = response.json::<serde_json::Value>().await.unwrap_or(
                serde_json::json!({"error": "Unknown error", "message": "Failed to validate token"}),
            );
            let message = error_response["message"]
                .as_str()
                .unwrap_or("Failed to validate token")
                .to_string();
            warn!("Token validation failed: {}", message);
            return Err(AppError::Unauthorized(message));
        }

        let document = response.json::<RemoteUserDocument>().await?;
        let claims: Claims = document.into();
        info!(
            "Token validated successfully for user_id: {}",
            claims.user_id
        );
        Ok(claims)
    }
}

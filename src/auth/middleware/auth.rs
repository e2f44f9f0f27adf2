//! # Authentication Middleware Module
//!
//! Middleware for authenticating requests to secured API endpoints. Tokens
//! are validated by the external auth service; the validated canonical
//! [`crate::common::jwt::Claims`] are added to the request extensions for
//! route handlers.
//!
//! ## Usage
//! ```rust,ignore
//! // In main.rs or app configuration
//! .service(
//!     web::scope("/secured")
//!         .wrap(auth::AuthMiddleware::new(
//!             config.auth_service_url.clone(),
//!             config.auth_api_key.clone()
//!         ))
//!         .service(/* secured endpoints */)
//! )
//! ```

use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use crate::auth::services::auth_client::AuthClient;

/// Authentication middleware for securing API endpoints.
///
/// # Fields
/// * `auth_service_url` - URL of the authentication service
/// * `auth_api_key` - API key for the authentication service
pub struct AuthMiddleware {
    auth_service_url: Rc<String>,
    auth_api_key: Rc<String>,
}

impl AuthMiddleware {
    pub fn new(service_url: String, api_key: String) -> Self {
        AuthMiddleware {
            auth_service_url: Rc::new(service_url),
            auth_api_key: Rc::new(api_key),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            auth_service_url: self.auth_service_url.clone(),
            api_key: self.auth_api_key.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    auth_service_url: Rc<String>,
    api_key: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Only require authorization for paths under "/api/secured";
        // public endpoints bypass validation entirely.
        let path = req.path();
        let auth_service_url = self.auth_service_url.clone();
        let api_key = self.api_key.clone();

        if !path.contains("/api/secured") {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) });
        }

        // Extract the bearer token from the Authorization header
        let token_value = req
            .headers()
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.to_string());

        let auth_client = AuthClient::new(
            auth_service_url.as_ref().clone(),
            api_key.as_ref().clone(),
        );

        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            if let Some(token) = token_value {
                match auth_client.validate_token(&token).await {
                    Ok(claims) => {
                        // Make the canonical claims available to handlers
                        req.extensions_mut().insert(claims);
                        srv.call(req).await.map(|res| res.map_into_boxed_body())
                    }
                    Err(_) => {
                        let response = HttpResponse::Unauthorized()
                            .json(serde_json::json!({"error": "Invalid token"}))
                            .map_into_boxed_body();
                        Ok(req.into_response(response))
                    }
                }
            } else {
                let response = HttpResponse::Unauthorized()
                    .json(serde_json::json!({"error": "Authorization token missing"}))
                    .map_into_boxed_body();
                Ok(req.into_response(response))
            }
        })
    }
}

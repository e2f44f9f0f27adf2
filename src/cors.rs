use actix_cors::Cors;
use actix_web::http::header;

pub fn default(origin: &str) -> Cors {
    Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .allowed_origin(origin)
        .supports_credentials()
        .max_age(3600)
}

/// Open policy for the authorize endpoint, which is called from arbitrary
/// storefront origins before the user ever reaches the dashboard.
pub fn open() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

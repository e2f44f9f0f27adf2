use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to initialize and run the service: database
/// connection details, server host/port, worker count, CORS settings,
/// logging preferences, the auth-service endpoint, the Razorpay gateway
/// credentials and the autopay poll interval.
pub struct Config {
    /// url to reach the authentication service
    pub auth_service_url: String,
    /// api key REQUIRED to make validate-token calls to the auth service
    pub auth_api_key: String,
    /// jwt secret used to decode tokens for request-log attribution
    pub jwt_secret: String,
    /// development or production
    pub environment: String,
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Razorpay public key id, echoed to the checkout widget.
    pub razorpay_key_id: String,
    /// Razorpay secret, used for Orders API basic auth. Never leaves the server.
    pub razorpay_key_secret: String,
    /// Base URL of the Razorpay REST API.
    pub razorpay_api_base: String,
    /// How often the autopay poller scans for due subscriptions, in seconds.
    pub autopay_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `DATABASE_URL`: Connection string for the database
    /// - `JWT_SECRET`: Secret key for decoding JWT tokens
    /// - `AUTH_SERVICE_URL` / `AUTH_API_KEY`: Auth-service endpoint
    /// - `ENVIRONMENT`: "development" or "production"
    /// - `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET`: Gateway credentials
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `RAZORPAY_API_BASE`: Gateway base URL (default: "https://api.razorpay.com")
    /// - `AUTOPAY_INTERVAL_SECS`: Autopay poll interval (default: 300)
    ///
    /// # Panics
    ///
    /// Panics if a required environment variable is missing or a numeric
    /// value cannot be parsed.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            auth_service_url: env::var("AUTH_SERVICE_URL").expect("AUTH_SERVICE_URL must be set"),
            auth_api_key: env::var("AUTH_API_KEY").expect("AUTH_API_KEY must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID must be set"),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET")
                .expect("RAZORPAY_KEY_SECRET must be set"),
            razorpay_api_base: env::var("RAZORPAY_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            autopay_interval_secs: env::var("AUTOPAY_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
        })
    }
}

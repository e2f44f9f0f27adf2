// Library root for the subscriptions service.

// Subscription / payment API module
pub mod api_subs {
    pub mod routes {
        pub mod admin;
        pub mod pay;
        pub mod sub;
    }

    pub mod services {
        pub mod autopay;
        pub mod checkout;
        pub mod package;
        pub mod pay;
        pub mod sub;
    }

    pub mod dtos {
        pub mod pay;
        pub mod sub;
    }

    pub mod models {
        pub mod sub;
    }

    pub mod mount;
}

// Auth module
pub mod auth {
    pub mod middleware {
        pub mod auth;
    }

    pub mod services {
        pub mod auth_client;
    }

    pub use self::middleware::auth::AuthMiddleware;
}

// Common utilities module
pub mod common {
    pub mod env_config;
    pub mod error;
    pub mod http;
    pub mod jwt;
    pub mod razorpay;
}

// Database module
pub mod db {
    pub mod log;
    pub mod user;

    pub mod models {
        pub mod log;
    }
}

// Logger module
pub mod logger;

// Re-export commonly used items for convenience
pub use common::error::AppError;
pub use common::http::Success;
pub use common::jwt::Claims;

use std::env;

use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use tracing::info;

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// CORS policy for the browser client. `CORS_ALLOWED_ORIGINS` is a comma
/// separated list; `*` allows any origin.
pub fn create_cors() -> rocket_cors::Cors {
    let allowed_origins_env =
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let origins = parse_origins(&allowed_origins_env);
    let allowed_origins = if origins.iter().any(|origin| origin == "*") {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&origins)
    };
    info!("CORS allowed origins: {:?}", origins);

    CorsOptions {
        allowed_origins,
        allowed_methods: [Method::Get, Method::Post, Method::Delete, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Accept", "Content-Type", "X-Requested-With"]),
        allow_credentials: false,
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to create CORS configuration")
}

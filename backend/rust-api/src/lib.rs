use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS configuration for the session API (consumed by the web client)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Collection endpoint, tolerant of an optional trailing slash. axum's
        // nested-root serves the bare `/api/v1/sessions`; this explicit route
        // covers `/api/v1/sessions/` so both forms reach the same handler.
        .route(
            "/api/v1/sessions/",
            post(handlers::sessions::create_session).layer(cors.clone()),
        )
        .nest("/api/v1/sessions", sessions_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn sessions_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", post(handlers::sessions::create_session))
        .route(
            "/{id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::exit_session),
        )
        .route("/{id}/answers", post(handlers::sessions::record_answer))
        .route("/{id}/advance", post(handlers::sessions::advance))
        .route("/{id}/previous", post(handlers::sessions::previous))
        .route("/{id}/submit", post(handlers::sessions::submit))
        .route("/{id}/review", post(handlers::sessions::open_review))
        .route("/{id}/stream", get(handlers::sse::session_stream))
}

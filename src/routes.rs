use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::require_auth;
use crate::config::Config;
use crate::handlers;
use crate::AppState;

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Login and signup, the OAuth round trip, and image fetches
    let public_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/auth/:provider", get(handlers::oauth::begin))
        .route("/auth/:provider/callback", get(handlers::oauth::callback))
        .route("/images/:id", get(handlers::images::serve));

    // Everything below requires a valid Bearer token
    let protected_routes = Router::new()
        .route(
            "/todos",
            get(handlers::todos::list).post(handlers::todos::create),
        )
        .route(
            "/todos/:id",
            get(handlers::todos::get)
                .put(handlers::todos::update)
                .delete(handlers::todos::delete),
        )
        .route("/me", get(handlers::user::get_me))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/health", get(health_check))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

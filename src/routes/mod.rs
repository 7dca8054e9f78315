use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{error::ApiError, state::AppState};

/// Liveness probe handler.
pub mod health;
/// Image upload, fetch, and delete handlers.
pub mod images;
/// Menu CRUD handlers.
pub mod menu;
/// Payment passthrough handlers.
pub mod payments;

// Request bodies are capped above the image ceiling so multipart uploads
// reach the pipeline's own 5 MiB enforcement instead of axum's default cap.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Assembles the full route table over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/menu",
            get(menu::list_menu_items).post(menu::create_menu_item),
        )
        .route(
            "/api/menu/:item_id",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route(
            "/api/images/:image_id",
            get(images::get_image).delete(images::delete_image),
        )
        .route(
            "/api/images/menu-item/:menu_item_id",
            get(images::get_menu_item_image).post(images::upload_menu_item_image),
        )
        .route(
            "/api/images/upload/:menu_item_id",
            post(images::upload_menu_item_image),
        )
        .route("/api/payments/intent", post(payments::create_payment_intent))
        .route("/api/payments/webhook", post(payments::stripe_webhook))
        .route(
            "/api/payments/:payment_intent_id",
            get(payments::get_payment_details),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

// Path ids are extracted as strings and parsed here so malformed values get
// the API's 400 message instead of axum's default rejection.
pub(crate) fn parse_id(raw: &str, what: &'static str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::InvalidId { what })
}

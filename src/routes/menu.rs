use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    error::ApiError,
    model::{MenuItemUpdate, NewMenuItem},
    routes::parse_id,
    state::AppState,
};

#[derive(Serialize)]
struct CreatedMenuItem {
    item_id: i64,
}

#[derive(Serialize)]
struct UpdateResponse {
    message: &'static str,
    #[serde(rename = "itemId")]
    item_id: i64,
    #[serde(rename = "affectedRows")]
    affected_rows: u64,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: &'static str,
    #[serde(rename = "itemId")]
    item_id: i64,
}

/// GET `/api/menu` — all menu items with their most recent image ids.
pub async fn list_menu_items(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.store.list_menu_items().await?;
    Ok(Json(items))
}

/// POST `/api/menu` — create a menu item.
pub async fn create_menu_item(
    State(state): State<Arc<AppState>>,
    Json(item): Json<NewMenuItem>,
) -> Result<impl IntoResponse, ApiError> {
    if item.item_name.trim().is_empty() {
        return Err(ApiError::MissingParameter { name: "item_name" });
    }
    let item_id = state.store.create_menu_item(&item).await?;
    Ok((StatusCode::CREATED, Json(CreatedMenuItem { item_id })))
}

/// PUT `/api/menu/:item_id` — partial update; absent fields are untouched.
pub async fn update_menu_item(
    State(state): State<Arc<AppState>>,
    Path(raw_item_id): Path<String>,
    Json(changes): Json<MenuItemUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = parse_id(&raw_item_id, "menu item")?;
    if changes.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }

    let affected_rows = state.store.update_menu_item(item_id, &changes).await?;
    if affected_rows == 0 {
        return Err(ApiError::NotFound { what: "Menu item" });
    }
    Ok(Json(UpdateResponse {
        message: "Menu item updated successfully",
        item_id,
        affected_rows,
    }))
}

/// DELETE `/api/menu/:item_id` — delete by identifier; zero affected rows
/// reports not-found.
pub async fn delete_menu_item(
    State(state): State<Arc<AppState>>,
    Path(raw_item_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = parse_id(&raw_item_id, "menu item")?;
    let affected = state.store.delete_menu_item(item_id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound { what: "Menu item" });
    }
    Ok(Json(DeleteResponse {
        message: "Menu item deleted successfully",
        item_id,
    }))
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::Field},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;

use crate::{
    error::ApiError, images::UPLOAD_FIELD, model::StoredImage, routes::parse_id, state::AppState,
};

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    #[serde(rename = "imageId")]
    image_id: i64,
    #[serde(rename = "menuItemId")]
    menu_item_id: i64,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: &'static str,
    #[serde(rename = "imageId")]
    image_id: i64,
}

/// GET `/api/images/:image_id` — serve one image verbatim.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(raw_image_id): Path<String>,
) -> Result<Response, ApiError> {
    let image_id = parse_id(&raw_image_id, "image")?;
    let image = state.images.resolve(Some(image_id), None).await?;
    Ok(image_response(image))
}

/// GET `/api/images/menu-item/:menu_item_id` — serve the most recent image
/// for a menu item.
pub async fn get_menu_item_image(
    State(state): State<Arc<AppState>>,
    Path(raw_menu_item_id): Path<String>,
) -> Result<Response, ApiError> {
    let menu_item_id = parse_id(&raw_menu_item_id, "menu item")?;
    let image = state.images.resolve(None, Some(menu_item_id)).await?;
    Ok(image_response(image))
}

/// POST `/api/images/menu-item/:menu_item_id` (and the alternate
/// `/api/images/upload/:menu_item_id`) — ingest one multipart image.
pub async fn upload_menu_item_image(
    State(state): State<Arc<AppState>>,
    Path(raw_menu_item_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let menu_item_id = parse_id(&raw_menu_item_id, "menu item")?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Multipart(err.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(ToOwned::to_owned);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();

        let stream = Box::pin(field_stream(field));
        let image_id = state
            .images
            .upload(menu_item_id, file_name.as_deref(), &content_type, stream)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "Image uploaded successfully",
                image_id,
                menu_item_id,
            }),
        ));
    }

    Err(ApiError::MissingFile)
}

/// DELETE `/api/images/:image_id` — remove one image.
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(raw_image_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let image_id = parse_id(&raw_image_id, "image")?;
    state.images.delete(image_id).await?;
    Ok(Json(DeleteResponse {
        message: "Image deleted successfully",
        image_id,
    }))
}

fn image_response(image: StoredImage) -> Response {
    ([(header::CONTENT_TYPE, image.mime_type)], image.data).into_response()
}

fn field_stream(field: Field<'_>) -> impl Stream<Item = Result<Bytes, ApiError>> + '_ {
    futures::stream::unfold(field, |mut field| async move {
        match field.chunk().await {
            Ok(Some(chunk)) => Some((Ok(chunk), field)),
            Ok(None) => None,
            Err(err) => Some((Err(ApiError::Multipart(err.to_string())), field)),
        }
    })
}

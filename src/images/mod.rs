//! The image path: ingestion (validate, stage, persist), resolution
//! (by id or most-recent-for-item), and lifecycle (delete).

use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use mime::Mime;
use tracing::info;

use crate::{error::ApiError, model::StoredImage, store::MenuStore};

mod staging;

pub use staging::{StagedFile, StagingArea, staged_extension};

/// Per-file upload ceiling.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Multipart field name carrying the image.
pub const UPLOAD_FIELD: &str = "image";

/// Orchestrates the image path over an injected store handle, so the whole
/// pipeline runs against an in-memory store in tests.
pub struct ImageService {
    store: Arc<dyn MenuStore>,
    staging: StagingArea,
}

impl ImageService {
    /// Creates a service over a store handle and a staging area.
    pub fn new(store: Arc<dyn MenuStore>, staging: StagingArea) -> Self {
        Self { store, staging }
    }

    /// Ingests one uploaded file for `menu_item_id` and returns the new
    /// image id.
    ///
    /// The declared MIME type is checked before any byte reaches disk; the
    /// stream is then staged (the size ceiling applies as bytes arrive),
    /// the owning item is existence-checked, and the staged contents are
    /// inserted as a new image row. The staged file is removed on every
    /// exit path.
    pub async fn upload<S>(
        &self,
        menu_item_id: i64,
        file_name: Option<&str>,
        content_type: &str,
        stream: S,
    ) -> Result<i64, ApiError>
    where
        S: Stream<Item = Result<Bytes, ApiError>> + Unpin,
    {
        let mime = validate_image_mime(content_type)?;

        let staged = self.staging.stage(file_name, stream).await?;
        let outcome = self.persist(menu_item_id, mime.essence_str(), &staged).await;
        staged.remove().await;
        outcome
    }

    async fn persist(
        &self,
        menu_item_id: i64,
        mime_type: &str,
        staged: &StagedFile,
    ) -> Result<i64, ApiError> {
        if !self.store.menu_item_exists(menu_item_id).await? {
            return Err(ApiError::NotFound { what: "Menu item" });
        }

        let data = staged.read().await?;
        let image_id = self
            .store
            .insert_image(menu_item_id, &data, mime_type)
            .await?;
        info!(image_id, menu_item_id, bytes = data.len(), "image stored");
        Ok(image_id)
    }

    /// Picks which stored image to return: direct lookup when `image_id`
    /// is given, otherwise the most recent image for `menu_item_id`.
    /// Supplying neither selector is a request error.
    pub async fn resolve(
        &self,
        image_id: Option<i64>,
        menu_item_id: Option<i64>,
    ) -> Result<StoredImage, ApiError> {
        let image = match (image_id, menu_item_id) {
            (Some(id), _) => self.store.image_by_id(id).await?,
            (None, Some(item_id)) => self.store.latest_image_for_item(item_id).await?,
            (None, None) => {
                return Err(ApiError::MissingParameter {
                    name: "imageId or menuItemId",
                });
            }
        };
        image.ok_or(ApiError::NotFound { what: "Image" })
    }

    /// Deletes one image by id. The image is existence-checked through the
    /// direct-lookup path first; a delete that then affects zero rows (a
    /// concurrent delete won) reports not-found as well, so both callers
    /// see the same outcome.
    pub async fn delete(&self, image_id: i64) -> Result<(), ApiError> {
        self.resolve(Some(image_id), None).await?;

        let affected = self.store.delete_image(image_id).await?;
        if affected == 0 {
            return Err(ApiError::NotFound { what: "Image" });
        }
        info!(image_id, "image deleted");
        Ok(())
    }
}

fn validate_image_mime(content_type: &str) -> Result<Mime, ApiError> {
    let mime: Mime = content_type
        .parse()
        .map_err(|_| ApiError::UnsupportedMediaType {
            mime: content_type.to_owned(),
        })?;
    if mime.type_() != mime::IMAGE {
        return Err(ApiError::UnsupportedMediaType {
            mime: mime.essence_str().to_owned(),
        });
    }
    Ok(mime)
}

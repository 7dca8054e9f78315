use async_trait::async_trait;
use sqlx::mysql::MySqlPool;

use crate::{
    error::StoreError,
    model::{MenuItemSummary, MenuItemUpdate, NewMenuItem, StoredImage},
};

/// Query capability borrowed by the pipeline, resolution, and lifecycle
/// components. Implementations own all SQL; callers never see rows, only
/// typed records. The seam exists so the image path can run against an
/// in-memory double in tests.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// All menu items, each carrying its most recent image id.
    async fn list_menu_items(&self) -> Result<Vec<MenuItemSummary>, StoreError>;

    /// Inserts a menu item and returns the generated identifier.
    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<i64, StoreError>;

    /// Applies a partial update; returns the affected-row count.
    async fn update_menu_item(
        &self,
        item_id: i64,
        changes: &MenuItemUpdate,
    ) -> Result<u64, StoreError>;

    /// Deletes a menu item by identifier; returns the affected-row count.
    async fn delete_menu_item(&self, item_id: i64) -> Result<u64, StoreError>;

    /// True when a menu item with this identifier exists.
    async fn menu_item_exists(&self, item_id: i64) -> Result<bool, StoreError>;

    /// Inserts an image row and returns the generated identifier.
    async fn insert_image(
        &self,
        menu_item_id: i64,
        data: &[u8],
        mime_type: &str,
    ) -> Result<i64, StoreError>;

    /// Direct lookup by image identifier.
    async fn image_by_id(&self, image_id: i64) -> Result<Option<StoredImage>, StoreError>;

    /// Most recently uploaded image for a menu item, by upload timestamp
    /// descending with the identifier as tiebreak.
    async fn latest_image_for_item(
        &self,
        menu_item_id: i64,
    ) -> Result<Option<StoredImage>, StoreError>;

    /// Deletes an image by identifier; returns the affected-row count.
    async fn delete_image(&self, image_id: i64) -> Result<u64, StoreError>;
}

/// `MenuStore` over the MySQL pool. Every statement is parameterized.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: MySqlPool,
}

impl SqlStore {
    /// Wraps an already-connected pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// The original's list query LEFT JOINed images and returned one row per
// (item, image) pair; the correlated subquery keeps one row per item and
// matches the resolution policy's ordering.
const LIST_MENU_ITEMS: &str = "\
SELECT m.item_id, m.item_name, m.item_desc, m.price, m.item_type,
       (SELECT mi.image_id
          FROM menu_item_images mi
         WHERE mi.menu_item_id = m.item_id
         ORDER BY mi.uploaded_at DESC, mi.image_id DESC
         LIMIT 1) AS image_id
  FROM menu_items m
 ORDER BY m.item_id";

const UPDATE_MENU_ITEM: &str = "\
UPDATE menu_items
   SET item_name = COALESCE(?, item_name),
       item_desc = COALESCE(?, item_desc),
       price     = COALESCE(?, price),
       item_type = COALESCE(?, item_type)
 WHERE item_id = ?";

const LATEST_IMAGE_FOR_ITEM: &str = "\
SELECT image_data AS data, image_type AS mime_type
  FROM menu_item_images
 WHERE menu_item_id = ?
 ORDER BY uploaded_at DESC, image_id DESC
 LIMIT 1";

#[async_trait]
impl MenuStore for SqlStore {
    async fn list_menu_items(&self) -> Result<Vec<MenuItemSummary>, StoreError> {
        sqlx::query_as::<_, MenuItemSummary>(LIST_MENU_ITEMS)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "fetch items",
                source,
            })
    }

    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO menu_items (item_name, item_desc, price, item_type) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.item_name)
        .bind(&item.item_desc)
        .bind(item.price)
        .bind(&item.item_type)
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Query {
            action: "create menu item",
            source,
        })?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update_menu_item(
        &self,
        item_id: i64,
        changes: &MenuItemUpdate,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(UPDATE_MENU_ITEM)
            .bind(&changes.item_name)
            .bind(&changes.item_desc)
            .bind(changes.price)
            .bind(&changes.item_type)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "update menu item",
                source,
            })?;
        Ok(result.rows_affected())
    }

    async fn delete_menu_item(&self, item_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE item_id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "delete menu item",
                source,
            })?;
        Ok(result.rows_affected())
    }

    async fn menu_item_exists(&self, item_id: i64) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT item_id FROM menu_items WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "check menu item",
                source,
            })?;
        Ok(found.is_some())
    }

    async fn insert_image(
        &self,
        menu_item_id: i64,
        data: &[u8],
        mime_type: &str,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO menu_item_images (menu_item_id, image_data, image_type) VALUES (?, ?, ?)",
        )
        .bind(menu_item_id)
        .bind(data)
        .bind(mime_type)
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Query {
            action: "insert image",
            source,
        })?;
        Ok(result.last_insert_id() as i64)
    }

    async fn image_by_id(&self, image_id: i64) -> Result<Option<StoredImage>, StoreError> {
        sqlx::query_as::<_, StoredImage>(
            "SELECT image_data AS data, image_type AS mime_type FROM menu_item_images WHERE image_id = ?",
        )
        .bind(image_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| StoreError::Query {
            action: "fetch image",
            source,
        })
    }

    async fn latest_image_for_item(
        &self,
        menu_item_id: i64,
    ) -> Result<Option<StoredImage>, StoreError> {
        sqlx::query_as::<_, StoredImage>(LATEST_IMAGE_FOR_ITEM)
            .bind(menu_item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "fetch image",
                source,
            })
    }

    async fn delete_image(&self, image_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM menu_item_images WHERE image_id = ?")
            .bind(image_id)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "delete image",
                source,
            })?;
        Ok(result.rows_affected())
    }
}

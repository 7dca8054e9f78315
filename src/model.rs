use serde::{Deserialize, Serialize};

/// A menu item as listed by the API, joined with its most recent image id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MenuItemSummary {
    /// Server-assigned identifier.
    pub item_id: i64,
    /// Display name.
    pub item_name: String,
    /// Optional description.
    pub item_desc: Option<String>,
    /// Price in major currency units.
    pub price: f64,
    /// Optional category, e.g. `"Main Course"`.
    pub item_type: Option<String>,
    /// Most recently uploaded image for this item, if any.
    pub image_id: Option<i64>,
}

/// Payload for creating a menu item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    /// Display name.
    pub item_name: String,
    /// Optional description.
    pub item_desc: Option<String>,
    /// Price in major currency units.
    pub price: f64,
    /// Optional category.
    pub item_type: Option<String>,
}

/// Partial update for a menu item; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemUpdate {
    /// New display name.
    pub item_name: Option<String>,
    /// New description.
    pub item_desc: Option<String>,
    /// New price.
    pub price: Option<f64>,
    /// New category.
    pub item_type: Option<String>,
}

impl MenuItemUpdate {
    /// True when no field is present to update.
    pub fn is_empty(&self) -> bool {
        self.item_name.is_none()
            && self.item_desc.is_none()
            && self.price.is_none()
            && self.item_type.is_none()
    }
}

/// A stored image payload as served back to clients.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredImage {
    /// Raw image bytes, written to the response verbatim.
    pub data: Vec<u8>,
    /// MIME type recorded at upload time.
    pub mime_type: String,
}

#![allow(dead_code, missing_docs)]

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use platter::{
    ApiError, Config, ImageService, MenuItemSummary, MenuItemUpdate, MenuStore, NewMenuItem,
    StagingArea, StoreError, StoredImage,
};
use uuid::Uuid;

/// Multipart boundary used by every hand-built request body.
pub const BOUNDARY: &str = "BOUND";
/// Matching `Content-Type` header value.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data; boundary=BOUND";

/// In-memory `MenuStore` double. Upload order doubles as the clock, so
/// "most recent" is deterministic without real timestamps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_item_id: i64,
    next_image_id: i64,
    clock: i64,
    items: BTreeMap<i64, NewMenuItem>,
    images: BTreeMap<i64, ImageRow>,
}

struct ImageRow {
    menu_item_id: i64,
    data: Vec<u8>,
    mime_type: String,
    uploaded_at: i64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn image_count(&self) -> usize {
        self.inner.lock().expect("store lock").images.len()
    }
}

fn latest_image_id(inner: &Inner, menu_item_id: i64) -> Option<i64> {
    inner
        .images
        .iter()
        .filter(|(_, row)| row.menu_item_id == menu_item_id)
        .max_by_key(|(id, row)| (row.uploaded_at, **id))
        .map(|(id, _)| *id)
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn list_menu_items(&self) -> Result<Vec<MenuItemSummary>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .items
            .iter()
            .map(|(item_id, item)| MenuItemSummary {
                item_id: *item_id,
                item_name: item.item_name.clone(),
                item_desc: item.item_desc.clone(),
                price: item.price,
                item_type: item.item_type.clone(),
                image_id: latest_image_id(&inner, *item_id),
            })
            .collect())
    }

    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.next_item_id += 1;
        let item_id = inner.next_item_id;
        inner.items.insert(item_id, item.clone());
        Ok(item_id)
    }

    async fn update_menu_item(
        &self,
        item_id: i64,
        changes: &MenuItemUpdate,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        let Some(item) = inner.items.get_mut(&item_id) else {
            return Ok(0);
        };
        if let Some(name) = &changes.item_name {
            item.item_name = name.clone();
        }
        if let Some(desc) = &changes.item_desc {
            item.item_desc = Some(desc.clone());
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        if let Some(kind) = &changes.item_type {
            item.item_type = Some(kind.clone());
        }
        Ok(1)
    }

    async fn delete_menu_item(&self, item_id: i64) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner.items.remove(&item_id).is_none() {
            return Ok(0);
        }
        // Mirrors the schema's ON DELETE CASCADE.
        inner.images.retain(|_, row| row.menu_item_id != item_id);
        Ok(1)
    }

    async fn menu_item_exists(&self, item_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store lock")
            .items
            .contains_key(&item_id))
    }

    async fn insert_image(
        &self,
        menu_item_id: i64,
        data: &[u8],
        mime_type: &str,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.next_image_id += 1;
        inner.clock += 1;
        let image_id = inner.next_image_id;
        let uploaded_at = inner.clock;
        inner.images.insert(
            image_id,
            ImageRow {
                menu_item_id,
                data: data.to_vec(),
                mime_type: mime_type.to_owned(),
                uploaded_at,
            },
        );
        Ok(image_id)
    }

    async fn image_by_id(&self, image_id: i64) -> Result<Option<StoredImage>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.images.get(&image_id).map(|row| StoredImage {
            data: row.data.clone(),
            mime_type: row.mime_type.clone(),
        }))
    }

    async fn latest_image_for_item(
        &self,
        menu_item_id: i64,
    ) -> Result<Option<StoredImage>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(latest_image_id(&inner, menu_item_id).map(|image_id| {
            let row = &inner.images[&image_id];
            StoredImage {
                data: row.data.clone(),
                mime_type: row.mime_type.clone(),
            }
        }))
    }

    async fn delete_image(&self, image_id: i64) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        Ok(u64::from(inner.images.remove(&image_id).is_some()))
    }
}

pub fn temp_root(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("platter-test-{tag}-{}", Uuid::new_v4()))
}

pub async fn cleanup(path: PathBuf) {
    let _ = tokio::fs::remove_dir_all(path).await;
}

/// True when the directory has no entries or was never created.
pub async fn dir_is_empty(path: &Path) -> bool {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => entries
            .next_entry()
            .await
            .expect("read_dir should succeed")
            .is_none(),
        Err(_) => true,
    }
}

pub fn bytes_stream(chunks: Vec<Vec<u8>>) -> impl Stream<Item = Result<Bytes, ApiError>> + Unpin {
    futures::stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))))
}

pub fn image_service(store: Arc<MemoryStore>, root: &Path, max_bytes: u64) -> ImageService {
    ImageService::new(store, StagingArea::new(root, max_bytes))
}

pub async fn seed_item(store: &MemoryStore, name: &str) -> i64 {
    store
        .create_menu_item(&NewMenuItem {
            item_name: name.to_owned(),
            item_desc: Some(format!("{name} with fries")),
            price: 9.99,
            item_type: Some("Main Course".to_owned()),
        })
        .await
        .expect("seed item should succeed")
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        port: 0,
        mysql_host: "localhost".to_owned(),
        mysql_port: 3306,
        mysql_database: "platter_test".to_owned(),
        mysql_user: "root".to_owned(),
        mysql_password: String::new(),
        upload_dir: upload_dir.display().to_string(),
        stripe_secret_key: String::new(),
        stripe_webhook_secret: "whsec_test".to_owned(),
    }
}

/// Builds a multipart body from `(field, file_name, content_type, body)`
/// tuples using the shared boundary.
pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (field, file_name, content_type, body) in parts {
        out.extend_from_slice(b"--BOUND\r\n");
        match file_name {
            Some(file_name) => {
                let disposition = format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
                );
                out.extend_from_slice(disposition.as_bytes());
                if let Some(content_type) = content_type {
                    let header = format!("Content-Type: {content_type}\r\n");
                    out.extend_from_slice(header.as_bytes());
                }
                out.extend_from_slice(b"\r\n");
            }
            None => {
                let disposition =
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n");
                out.extend_from_slice(disposition.as_bytes());
            }
        }
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"--BOUND--\r\n");
    out
}

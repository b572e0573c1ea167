//! Object storage for planet images.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stellar_core::{Result, StellarError};
use tokio::sync::RwLock;
use tracing::info;

/// Object store holding uploaded planet images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an object under `key` and return its public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Remove the object behind a URL previously returned by `put`.
    async fn remove(&self, url: &str) -> Result<()>;
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory implementation of [`ImageStore`] serving URLs under a base URL.
#[derive(Clone)]
pub struct InMemoryImageStore {
    base_url: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl InMemoryImageStore {
    /// Create a store whose URLs start with `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch an object by key.
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn key_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_url.as_str())?.strip_prefix('/')
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(StellarError::ObjectStore("empty object key".to_string()));
        }

        let size = bytes.len();
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        info!(key, size, "stored image object");

        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn remove(&self, url: &str) -> Result<()> {
        let key = self
            .key_of(url)
            .ok_or_else(|| StellarError::ObjectStore(format!("url {url} is not served by this store")))?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}

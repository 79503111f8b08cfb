use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// The server-owned API key slot. Turns read a snapshot; admin calls rotate it.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl KeyStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.filter(|k| !k.trim().is_empty()))),
        }
    }

    pub async fn snapshot(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    pub async fn is_set(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn set(&self, key: String) {
        *self.inner.write().await = Some(key);
        info!("API key updated");
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
        info!("API key cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_initial_key_is_ignored() {
        assert!(!KeyStore::new(Some("   ".to_string())).is_set().await);
        assert!(!KeyStore::new(None).is_set().await);
    }

    #[tokio::test]
    async fn test_clones_share_the_slot() {
        let store = KeyStore::new(None);
        let other = store.clone();
        store.set("sk-test".to_string()).await;
        assert_eq!(other.snapshot().await.as_deref(), Some("sk-test"));
        other.clear().await;
        assert!(store.snapshot().await.is_none());
    }
}

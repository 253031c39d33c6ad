//! In-process definition store.

use std::collections::HashMap;

use async_trait::async_trait;
use compdef_shared::{CompdefError, Definition, DefinitionStore, Result, StoreCoordinates};
use tokio::sync::RwLock;

/// [`DefinitionStore`] backed by a map of serialized bodies.
///
/// Bodies are kept serialized so reads go through the same decode path as
/// the libSQL store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, coordinates: &StoreCoordinates) -> bool {
        self.entries
            .read()
            .await
            .contains_key(&coordinates.store_key())
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore {
    async fn get(&self, coordinates: &StoreCoordinates) -> Result<Definition> {
        let key = coordinates.store_key();
        let entries = self.entries.read().await;
        let body = entries
            .get(&key)
            .ok_or_else(|| CompdefError::not_found(key.as_str()))?;
        Ok(serde_json::from_slice(body)?)
    }

    async fn store(&self, coordinates: &StoreCoordinates, body: Vec<u8>) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(coordinates.store_key(), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compdef_shared::Coordinates;

    #[tokio::test]
    async fn roundtrip_and_miss() {
        let store = MemoryStore::new();
        let key = Coordinates::new("git", "github", Some("foo"), "bar", "abc123")
            .to_store_coordinates("definition", "1");

        assert!(store.get(&key).await.unwrap_err().is_not_found());
        assert!(store.is_empty().await);

        store
            .store(&key, br#"{"described":{"tools":["curation"]}}"#.to_vec())
            .await
            .unwrap();

        assert!(store.contains(&key).await);
        assert_eq!(store.get(&key).await.unwrap().tools(), ["curation"]);
        assert_eq!(store.len().await, 1);
    }
}

use crate::store::{Collection, Document, DocumentStore, Filter, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process document store. Version checks happen under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        mut data: Value,
    ) -> Result<Document, StoreError> {
        let object = data.as_object_mut().ok_or(StoreError::NotAnObject)?;
        object.insert("id".to_string(), Value::String(id.to_string()));

        let document = Document {
            id: id.to_string(),
            version: 1,
            data,
        };

        let mut collections = self.collections.write().await;
        match collections.entry(collection).or_default().entry(id.to_string()) {
            Entry::Occupied(_) => {
                return Err(StoreError::AlreadyExists {
                    collection,
                    id: id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
            }
        }

        debug!("Created {}/{}", collection, id);
        Ok(document)
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, StoreError> {
        let Value::Object(fields) = patch else {
            return Err(StoreError::NotAnObject);
        };

        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        if let Some(expected) = expected_version {
            if document.version != expected {
                return Err(StoreError::VersionMismatch {
                    collection,
                    id: id.to_string(),
                    expected,
                    actual: document.version,
                });
            }
        }

        let object = document.data.as_object_mut().ok_or(StoreError::NotAnObject)?;
        for (key, value) in fields {
            if key != "id" {
                object.insert(key, value);
            }
        }
        document.version += 1;

        debug!("Updated {}/{} to version {}", collection, id, document.version);
        Ok(document.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Document> = docs
            .values()
            .filter(|doc| filters.iter().all(|filter| filter.matches(&doc.data)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_get_update_delete() {
        let store = MemoryStore::new();
        let created = store
            .create(Collection::Posts, "p1", json!({"title": "hi", "commentCount": 0}))
            .await
            .unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(created.data["id"], "p1");

        let updated = store
            .update(Collection::Posts, "p1", json!({"commentCount": 1, "id": "hijack"}), None)
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.data["commentCount"], 1);
        assert_eq!(updated.data["title"], "hi");
        assert_eq!(updated.data["id"], "p1");

        store.delete(Collection::Posts, "p1").await.unwrap();
        assert!(store.get(Collection::Posts, "p1").await.unwrap().is_none());
        assert!(matches!(
            store.delete(Collection::Posts, "p1").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryStore::new();
        store.create(Collection::Inquiries, "i1", json!({"status": "active"})).await.unwrap();

        store
            .update(Collection::Inquiries, "i1", json!({"status": "completed"}), Some(1))
            .await
            .unwrap();
        let err = store
            .update(Collection::Inquiries, "i1", json!({"status": "cancelled"}), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch { expected: 1, actual: 2, .. }));

        let doc = store.get(Collection::Inquiries, "i1").await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "completed");
    }

    #[tokio::test]
    async fn query_by_equality() {
        let store = MemoryStore::new();
        let rows = [("a", "active", "s1"), ("b", "sold", "s1"), ("c", "active", "s2")];
        for (id, status, seller) in rows {
            store
                .create(Collection::Items, id, json!({"status": status, "sellerId": seller}))
                .await
                .unwrap();
        }

        let active = store
            .query(Collection::Items, &[Filter::eq("status", "active").unwrap()])
            .await
            .unwrap();
        let ids: Vec<&str> = active.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let mine = store
            .query(
                Collection::Items,
                &[
                    Filter::eq("status", "active").unwrap(),
                    Filter::eq("sellerId", "s1").unwrap(),
                ],
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(store.query(Collection::Posts, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_never_overwrites() {
        let store = MemoryStore::new();
        store.create(Collection::Inquiries, "i1", json!({"status": "active"})).await.unwrap();
        let err = store
            .create(Collection::Inquiries, "i1", json!({"status": "reported"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let doc = store.get(Collection::Inquiries, "i1").await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "active");
        assert_eq!(doc.version, 1);
    }

    #[tokio::test]
    async fn non_object_documents_are_refused() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create(Collection::Items, "x", json!([1])).await,
            Err(StoreError::NotAnObject)
        ));
    }
}

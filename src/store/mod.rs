pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Collections the application reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Inquiries,
    Posts,
    Comments,
    Studios,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Items => "marketplace_items",
            Collection::Inquiries => "inquiries",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Studios => "studios",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} does not exist")]
    NotFound { collection: Collection, id: String },

    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: String },

    #[error("{collection}/{id} is at version {actual}, expected {expected}")]
    VersionMismatch {
        collection: Collection,
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("document body must be a JSON object")]
    NotAnObject,

    #[error("Failed to (de)serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored document. `version` starts at 1 and increases on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Equality filter on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Serialize) -> Result<Self, StoreError> {
        Ok(Self {
            field: field.into(),
            value: serde_json::to_value(value)?,
        })
    }

    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// Document database boundary.
/// The backing service owns consistency; this trait only exposes single-document
/// reads and writes plus equality queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document under `id`. The `id` field of `data` is set to match.
    /// Fails with `AlreadyExists` when `id` is taken.
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Document, StoreError>;

    async fn get(&self, collection: Collection, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Merge the top-level fields of `patch` into the document.
    /// With `expected_version` set, the write is rejected unless the document
    /// is still at that version.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Documents whose fields match every filter
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_compare_serialized_values() {
        let filter = Filter::eq("status", crate::models::ItemStatus::Active).unwrap();
        assert!(filter.matches(&json!({"status": "active"})));
        assert!(!filter.matches(&json!({"status": "sold"})));
        assert!(!filter.matches(&json!({})));
    }
}

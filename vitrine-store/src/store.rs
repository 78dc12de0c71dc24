//! Document store abstraction and the file-backed implementation.
//!
//! Documents are schemaless JSON values grouped into named collections.
//! Writers are either whole-document puts or dotted-path field updates;
//! every successful write emits a change event so snapshot holders can
//! refetch.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use vitrine_core::path::{ContentPath, PathError};

/// Collection names used by the site.
pub mod collections {
    pub const COMPANY_CONTENT: &str = "company_content";
    pub const COMPANY_IMAGES: &str = "company_images";
    pub const WEBSITE_CONTENT: &str = "website_content";
    pub const WEBSITE_IMAGES: &str = "website_images";
    pub const FOOTER_CONTENT: &str = "footer_content";
    pub const ADMINS: &str = "admins";

    /// Singleton documents (website content/images, footer) live under
    /// this id.
    pub const MAIN_DOC: &str = "main";
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("document does not exist: {collection}/{doc}")]
    MissingDocument { collection: String, doc: String },

    #[error("invalid collection or document name: {0}")]
    InvalidName(String),
}

/// Emitted after every successful write.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub collection: String,
    pub doc: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection as `(id, value)` pairs. A collection
    /// that was never written to is an empty list, not an error.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    async fn get(&self, collection: &str, doc: &str) -> Result<Option<Value>, StoreError>;

    /// Apply dotted-path field updates to one document, creating it if
    /// absent. Missing intermediates become mappings, which is how an
    /// array-index edit to a never-stored array persists as a
    /// numeric-keyed mapping.
    async fn update_fields(
        &self,
        collection: &str,
        doc: &str,
        fields: &[(String, Value)],
    ) -> Result<(), StoreError>;

    /// Replace a document wholesale.
    async fn put(&self, collection: &str, doc: &str, value: Value) -> Result<(), StoreError>;

    /// Change notifications for all collections.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// File-backed store: one JSON file per document under
/// `<root>/<collection>/<doc>.json`.
pub struct FsStore {
    root: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            root: root.into(),
            events,
        }
    }

    fn doc_path(&self, collection: &str, doc: &str) -> Result<PathBuf, StoreError> {
        check_name(collection)?;
        check_name(doc)?;
        Ok(self.root.join(collection).join(format!("{doc}.json")))
    }

    async fn load(&self, collection: &str, doc: &str) -> Result<Option<Value>, StoreError> {
        let path = self.doc_path(collection, doc)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, collection: &str, doc: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.doc_path(collection, doc)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(collection, doc, "document written");
        let _ = self.events.send(StoreEvent {
            collection: collection.to_string(),
            doc: doc.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        check_name(collection)?;
        let dir = self.root.join(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut docs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await?;
            docs.push((id.to_string(), serde_json::from_slice(&bytes)?));
        }
        docs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(docs)
    }

    async fn get(&self, collection: &str, doc: &str) -> Result<Option<Value>, StoreError> {
        self.load(collection, doc).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        doc: &str,
        fields: &[(String, Value)],
    ) -> Result<(), StoreError> {
        let mut value = self
            .load(collection, doc)
            .await?
            .unwrap_or_else(|| Value::Object(Map::new()));
        for (path, field_value) in fields {
            ContentPath::parse(path).set(&mut value, field_value.clone())?;
        }
        self.persist(collection, doc, &value).await
    }

    async fn put(&self, collection: &str, doc: &str, value: Value) -> Result<(), StoreError> {
        self.persist(collection, doc, &value).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Collection and document names end up as file names; anything outside
/// this alphabet is rejected before touching the filesystem.
fn check_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_and_list_round_trip() {
        let (_dir, store) = store();
        store
            .put(collections::COMPANY_CONTENT, "forkline", json!({"tagline": "hi"}))
            .await
            .unwrap();
        store
            .put(collections::COMPANY_CONTENT, "voltaic", json!({"tagline": "yo"}))
            .await
            .unwrap();

        let doc = store
            .get(collections::COMPANY_CONTENT, "forkline")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["tagline"], "hi");

        let all = store.list(collections::COMPANY_CONTENT).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "forkline");
    }

    #[tokio::test]
    async fn missing_collection_lists_empty() {
        let (_dir, store) = store();
        assert!(store.list("website_content").await.unwrap().is_empty());
        assert!(store
            .get("website_content", "main")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_fields_creates_document_and_sparse_encoding() {
        let (_dir, store) = store();
        store
            .update_fields(
                collections::COMPANY_CONTENT,
                "forkline",
                &[("section2.expertisePoints.1".to_string(), json!("edited"))],
            )
            .await
            .unwrap();

        let doc = store
            .get(collections::COMPANY_CONTENT, "forkline")
            .await
            .unwrap()
            .unwrap();
        // The array was never stored, so the index edit persists as a
        // numeric-keyed mapping.
        assert_eq!(doc, json!({"section2": {"expertisePoints": {"1": "edited"}}}));
    }

    #[tokio::test]
    async fn writes_emit_change_events() {
        let (_dir, store) = store();
        let mut events = store.subscribe();
        store
            .put(collections::FOOTER_CONTENT, "main", json!({"bottom": {"legal": "x"}}))
            .await
            .unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.collection, collections::FOOTER_CONTENT);
        assert_eq!(event.doc, "main");
    }

    #[tokio::test]
    async fn hostile_names_are_rejected() {
        let (_dir, store) = store();
        let err = store.get("../etc", "passwd").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
        let err = store
            .put(collections::ADMINS, "a/b", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }
}

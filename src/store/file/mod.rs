//! File-backed document store.
//!
//! Each collection is a single JSON array on disk:
//!
//! ```text
//! {data_dir}/
//!   users.json
//!   sessions.json
//!   events.json
//!   ...
//! ```
//!
//! Writes go through a temp file plus rename so a crash never leaves a
//! torn collection. A single write lock serialises mutations per database;
//! reads go straight to disk. There is no compare-and-set — lost updates
//! between a read and a write are possible and accepted at this boundary.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use super::document::{Document, DocumentBackend, document_key};
use super::error::{StoreError, StoreResult};
use super::ident::IdQuery;

/// File-backed implementation of [`DocumentBackend`].
///
/// Opened once at process start and injected into each entity store; there
/// is no ambient/global handle.
#[derive(Debug)]
pub struct FileDatabase {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDatabase {
    /// Open a database rooted at `data_dir`, creating the directory if
    /// needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StoreError::backend_io(&data_dir, e))?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    /// Load a whole collection. A missing file is an empty collection.
    async fn read_collection(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let path = self.collection_path(collection);

        let contents = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::backend_io(&path, e)),
        };

        let docs: Value = serde_json::from_slice(&contents)
            .map_err(|e| StoreError::backend_data(path.display().to_string(), e.to_string()))?;
        match docs {
            Value::Array(items) => Ok(items),
            other => Err(StoreError::backend_data(
                path.display().to_string(),
                format!("expected a JSON array, found {other}"),
            )),
        }
    }

    /// Persist a whole collection atomically (temp file + rename).
    async fn write_collection(&self, collection: &str, docs: &[Document]) -> StoreResult<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");

        let contents = serde_json::to_vec_pretty(docs)
            .map_err(|e| StoreError::backend_data(path.display().to_string(), e.to_string()))?;

        fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::backend_io(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::backend_io(&path, e))
    }
}

#[async_trait]
impl DocumentBackend for FileDatabase {
    async fn find_one(&self, collection: &str, query: &IdQuery) -> StoreResult<Option<Document>> {
        let docs = self.read_collection(collection).await?;
        Ok(docs
            .into_iter()
            .find(|d| document_key(d).is_some_and(|k| query.matches(&k))))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_collection(collection).await?;
        docs.push(doc);
        self.write_collection(collection, &docs).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        query: &IdQuery,
        doc: Document,
    ) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_collection(collection).await?;

        let Some(slot) = docs
            .iter_mut()
            .find(|d| document_key(d).is_some_and(|k| query.matches(&k)))
        else {
            return Ok(false);
        };
        *slot = doc;

        self.write_collection(collection, &docs).await?;
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, query: &IdQuery) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_collection(collection).await?;

        let before = docs.len();
        docs.retain(|d| !document_key(d).is_some_and(|k| query.matches(&k)));
        if docs.len() == before {
            return Ok(false);
        }

        self.write_collection(collection, &docs).await?;
        Ok(true)
    }

    async fn scan(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.read_collection(collection).await
    }
}

//! Generic document-store boundary.
//!
//! The database engine is an external collaborator: stores only ever
//! address it by collection name plus an id predicate, so any engine with
//! those primitives can sit behind this trait.

use async_trait::async_trait;
use serde_json::Value;

use super::error::StoreResult;
use super::ident::{IdQuery, RecordId};

/// A stored document. Records serialize through `serde_json::Value` with
/// their primary key under the `id` field.
pub type Document = Value;

/// Document-store interface shared by every entity store.
///
/// No transactions, no conditional writes: read-modify-write sequences in
/// the stores above are not atomic against concurrent writers, and the
/// domain layer is written to tolerate that.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Find the first document in `collection` whose key satisfies `query`.
    async fn find_one(&self, collection: &str, query: &IdQuery) -> StoreResult<Option<Document>>;

    /// Append a new document. The caller is responsible for key uniqueness
    /// (keys are minted, not caller-supplied).
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()>;

    /// Replace the first document matching `query`. Returns `false` if no
    /// document matched.
    async fn replace_one(
        &self,
        collection: &str,
        query: &IdQuery,
        doc: Document,
    ) -> StoreResult<bool>;

    /// Delete the first document matching `query`. Returns `false` if no
    /// document matched.
    async fn delete_one(&self, collection: &str, query: &IdQuery) -> StoreResult<bool>;

    /// All documents in a collection. Filtering and ordering happen in the
    /// entity stores, where the types are known.
    async fn scan(&self, collection: &str) -> StoreResult<Vec<Document>>;
}

/// Extract a document's primary key, if it carries a well-formed one.
pub fn document_key(doc: &Document) -> Option<RecordId> {
    doc.get("id")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

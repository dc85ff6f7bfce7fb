use anyhow::Result;
use futures::StreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Database, IndexModel};
use serde::{de::DeserializeOwned, Serialize};

use civitas_common::DocumentId;

/// A serde-mapped document living in its own MongoDB collection, keyed by a
/// hex `_id`.
#[async_trait::async_trait]
pub trait MongoDbObject:
    Sized + Serialize + DeserializeOwned + Sync + Unpin + Send + Clone
{
    const COLLECTION_NAME: &'static str;

    fn populate_id(&mut self);
    fn get_id(&self) -> DocumentId;

    /// Indexes created once at startup by `ensure_indexes`.
    fn indexes() -> Vec<IndexModel> {
        Vec::new()
    }

    fn id_filter(id: &DocumentId) -> Document {
        doc! { "_id": id.to_hex_string() }
    }

    async fn ensure_indexes(db: &Database) -> Result<()> {
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        for index in Self::indexes() {
            col.create_index(index, None).await?;
        }
        Ok(())
    }

    async fn save(&self, db: &Database) -> Result<()> {
        let mut obj = self.clone();
        obj.populate_id();
        let col = db.collection::<Self>(Self::COLLECTION_NAME);
        col.insert_one(obj, None).await?;
        Ok(())
    }

    /// Replaces the stored document only if it also matches `filter`.
    /// Returns whether a document was matched.
    async fn replace_where(&self, db: &Database, mut filter: Document) -> Result<bool> {
        filter.insert("_id", self.get_id().to_hex_string());
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        let result = col
            .replace_one(filter, bson::to_document(self)?, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Applies a raw update document (`$set`, `$addToSet`, ...) to the
    /// documents matching `filter`; returns the matched count.
    async fn update_where(db: &Database, filter: Document, update: Document) -> Result<u64> {
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        let result = col.update_many(filter, update, None).await?;
        Ok(result.matched_count)
    }

    async fn select_one_by_index(db: &Database, index: &DocumentId) -> Result<Option<Self>> {
        Self::select_one_by_filter(db, Self::id_filter(index)).await
    }

    async fn select_one_by_filter(db: &Database, filter: Document) -> Result<Option<Self>> {
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        match col.find_one(filter, None).await? {
            Some(d) => Ok(Some(bson::from_document(d)?)),
            None => Ok(None),
        }
    }

    async fn select_many(
        db: &Database, filter: Document,
        sort: Option<Document>, limit: Option<i64>,
    ) -> Result<Vec<Self>> {
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        let options = FindOptions::builder()
            .sort(sort)
            .limit(limit)
            .build();

        let mut docs = col.find(filter, Some(options)).await?;
        let mut vec = Vec::new();
        while let Some(doc) = docs.next().await {
            vec.push(bson::from_document(doc?)?);
        }
        Ok(vec)
    }

    async fn select_many_by_ids(db: &Database, ids: &[DocumentId]) -> Result<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let hex_ids: Vec<String> = ids.iter().map(DocumentId::to_hex_string).collect();
        Self::select_many(db, doc! { "_id": { "$in": hex_ids } }, None, None).await
    }

    async fn distinct_strings(db: &Database, field: &str, filter: Document) -> Result<Vec<String>> {
        let col = db.collection::<Document>(Self::COLLECTION_NAME);
        let values = col.distinct(field, filter, None).await?;
        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }
}

//! LanceDB-backed vector store.

use super::{dedupe_by_id, OpenMode, QueryHit, StoredRecord, VectorStore};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use askdoc_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Column holding the distance in vector query results.
const DISTANCE_COLUMN: &str = "_distance";

/// A single LanceDB table under the index directory.
pub struct LanceDbStore {
    table: Table,
    dimensions: usize,
}

impl LanceDbStore {
    /// Open the table, creating it if needed.
    ///
    /// A table whose embedding width differs from `dimensions` was built
    /// for another model and cannot be queried. In [`OpenMode::Query`] that
    /// is an error and the table is left untouched; in [`OpenMode::Rebuild`]
    /// it is dropped and recreated.
    pub async fn open(
        db_path: &Path,
        table_name: &str,
        dimensions: usize,
        mode: OpenMode,
    ) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::Store(format!("Failed to create index directory {:?}: {}", db_path, e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.iter().any(|name| name == table_name) {
            let table = conn
                .open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Store(format!("Failed to open table: {}", e)))?;

            match stored_dimensions(&table).await? {
                Some(existing) if existing != dimensions => match mode {
                    OpenMode::Query => {
                        return Err(AppError::Store(format!(
                            "Table '{}' holds {}-dimensional embeddings but {} are configured. \
                             Re-run `askdoc ingest` to rebuild the index",
                            table_name, existing, dimensions
                        )));
                    }
                    OpenMode::Rebuild => {
                        tracing::warn!(
                            "Table '{}' holds {}-dimensional embeddings, expected {}; recreating it",
                            table_name,
                            existing,
                            dimensions
                        );
                        drop(table);
                        remove_table_dir(db_path, table_name)?;
                        create_table(&conn, table_name, dimensions).await?
                    }
                },
                _ => table,
            }
        } else {
            create_table(&conn, table_name, dimensions).await?
        };

        tracing::debug!("Opened LanceDB table '{}' at {:?}", table_name, db_path);

        Ok(Self { table, dimensions })
    }

    fn records_to_batch(&self, records: &[StoredRecord]) -> AppResult<RecordBatch> {
        let schema = table_schema(self.dimensions);

        let mut values = Vec::with_capacity(records.len() * self.dimensions);
        for record in records {
            if record.embedding.len() != self.dimensions {
                return Err(AppError::Store(format!(
                    "Embedding dimension mismatch for '{}': expected {}, got {}",
                    record.id,
                    self.dimensions,
                    record.embedding.len()
                )));
            }
            values.extend_from_slice(&record.embedding);
        }

        let metadata_json = records
            .iter()
            .map(|r| serde_json::to_string(&r.metadata))
            .collect::<Result<Vec<_>, _>>()?;

        let embeddings = FixedSizeListArray::try_new(
            item_field(),
            self.dimensions as i32,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .map_err(arrow_error)?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()))),
                Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.text.as_str()))),
                Arc::new(embeddings),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| metadata_str(&r.metadata, "file_name")),
                )),
                Arc::new(UInt32Array::from_iter_values(
                    records.iter().map(|r| metadata_page(&r.metadata)),
                )),
                Arc::new(StringArray::from_iter_values(metadata_json)),
            ],
        )
        .map_err(arrow_error)
    }
}

#[async_trait::async_trait]
impl VectorStore for LanceDbStore {
    fn backend_name(&self) -> &'static str {
        "lancedb"
    }

    async fn upsert(&self, records: &[StoredRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let records = dedupe_by_id(records.to_vec());
        let batch = self.records_to_batch(&records)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let mut merge = self.table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map(|_| ())
            .map_err(|e| AppError::Store(format!("Failed to upsert records: {}", e)))?;

        tracing::debug!("Upserted {} records into LanceDB", records.len());
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryHit>> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Store(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        if self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| AppError::Store(format!("Failed to create query: {}", e)))?
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Store(format!("Failed to collect results: {}", e)))?;

        let mut hits = Vec::new();
        for batch in &batches {
            let ids = string_column(batch, "id")?;
            let texts = string_column(batch, "text")?;
            let metadata = string_column(batch, "metadata")?;
            let distances = batch
                .column_by_name(DISTANCE_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| AppError::Store("Missing _distance column".to_string()))?;

            for row in 0..batch.num_rows() {
                hits.push(QueryHit {
                    id: ids.value(row).to_string(),
                    text: texts.value(row).to_string(),
                    metadata: serde_json::from_str(metadata.value(row))?,
                    distance: distances.value(row),
                });
            }
        }

        tracing::debug!("LanceDB returned {} hits (top-{})", hits.len(), top_k);
        Ok(hits)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Store(format!("Failed to count rows: {}", e)))
    }

    async fn reset(&self) -> AppResult<()> {
        if self.count().await? > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| AppError::Store(format!("Failed to reset index: {}", e)))?;
        }

        tracing::info!("Reset LanceDB table");
        Ok(())
    }
}

fn item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

fn table_schema(dimensions: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(item_field(), dimensions as i32),
            false,
        ),
        Field::new("file_name", DataType::Utf8, false),
        Field::new("page", DataType::UInt32, false),
        // Full chunk metadata as JSON
        Field::new("metadata", DataType::Utf8, false),
    ]))
}

async fn create_table(conn: &Connection, name: &str, dimensions: usize) -> AppResult<Table> {
    let schema = table_schema(dimensions);
    let empty = RecordBatch::new_empty(schema.clone());

    conn.create_table(name, RecordBatchIterator::new(vec![Ok(empty)], schema))
        .execute()
        .await
        .map_err(|e| AppError::Store(format!("Failed to create table '{}': {}", name, e)))
}

/// Embedding width of an existing table.
async fn stored_dimensions(table: &Table) -> AppResult<Option<usize>> {
    let schema = table
        .schema()
        .await
        .map_err(|e| AppError::Store(format!("Failed to read table schema: {}", e)))?;

    Ok(schema
        .field_with_name("embedding")
        .ok()
        .and_then(|field| match field.data_type() {
            DataType::FixedSizeList(_, size) => Some(*size as usize),
            _ => None,
        }))
}

fn remove_table_dir(db_path: &Path, table_name: &str) -> AppResult<()> {
    let dir: PathBuf = db_path.join(format!("{}.lance", table_name));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| {
            AppError::Store(format!("Failed to remove stale table {:?}: {}", dir, e))
        })?;
    }
    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Store(format!("Invalid {} column", name)))
}

fn metadata_str<'a>(metadata: &'a serde_json::Value, key: &str) -> &'a str {
    metadata.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn metadata_page(metadata: &serde_json::Value) -> u32 {
    metadata
        .get("page")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32
}

fn arrow_error(e: ArrowError) -> AppError {
    AppError::Store(format!("Arrow error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, embedding: Vec<f32>, page: u32) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            text: format!("chunk {}", id),
            embedding,
            metadata: json!({ "file_name": "resume.pdf", "page": page }),
        }
    }

    #[tokio::test]
    async fn test_upsert_query_and_count() {
        let temp = TempDir::new().unwrap();
        let store = LanceDbStore::open(temp.path(), "documents", 3, OpenMode::Query)
            .await
            .unwrap();

        store
            .upsert(&[
                record("a", vec![1.0, 0.0, 0.0], 0),
                record("b", vec![0.0, 1.0, 0.0], 1),
                record("c", vec![0.0, 0.0, 1.0], 2),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        let hits = store.query(&[0.0, 1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[1].distance - 2.0).abs() < 1e-5);
        assert_eq!(hits[0].metadata["page"], 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let temp = TempDir::new().unwrap();
        let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
            .await
            .unwrap();

        store.upsert(&[record("a", vec![1.0, 0.0], 0)]).await.unwrap();
        let mut replacement = record("a", vec![0.0, 1.0], 0);
        replacement.text = "updated".to_string();
        store.upsert(&[replacement]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.query(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].text, "updated");
    }

    #[tokio::test]
    async fn test_reset_and_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
                .await
                .unwrap();
            store.upsert(&[record("a", vec![1.0, 0.0], 0)]).await.unwrap();
        }

        let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.query(&[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_keeps_rows_when_querying() {
        let temp = TempDir::new().unwrap();
        {
            let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
                .await
                .unwrap();
            store.upsert(&[record("a", vec![1.0, 0.0], 0)]).await.unwrap();
        }

        let result = LanceDbStore::open(temp.path(), "documents", 4, OpenMode::Query).await;
        match result {
            Err(AppError::Store(message)) => assert!(message.contains("Re-run `askdoc ingest`")),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("mismatched table opened for querying"),
        }

        let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_change_recreates_table_on_rebuild() {
        let temp = TempDir::new().unwrap();
        {
            let store = LanceDbStore::open(temp.path(), "documents", 2, OpenMode::Query)
                .await
                .unwrap();
            store.upsert(&[record("a", vec![1.0, 0.0], 0)]).await.unwrap();
        }

        let store = LanceDbStore::open(temp.path(), "documents", 4, OpenMode::Rebuild)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.upsert(&[record("b", vec![1.0, 0.0], 0)]).await.is_err());
    }
}

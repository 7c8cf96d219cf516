// file: src/database/client.rs
// description: LanceDB client wrapper with connection and collection management
// reference: https://docs.rs/lancedb

use crate::config::{DistanceMetric, StoreConfig};
use crate::database::schema::{CollectionSpec, SchemaManager};
use crate::error::{PipelineError, Result};
use crate::models::RetrievedDocument;
use arrow_array::{Float32Array, RecordBatch, StringArray};
use arrow_schema::SchemaRef;
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use tracing::{debug, info};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    config: StoreConfig,
}

/// An opened collection with the vector space it was created in.
#[derive(Clone)]
pub struct Collection {
    pub(crate) table: Table,
    pub(crate) schema: SchemaRef,
    name: String,
    spec: CollectionSpec,
}

impl LanceDbClient {
    pub async fn new(config: StoreConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self { connection, config })
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        // Try to list tables as a ping equivalent
        match self.connection.table_names().execute().await {
            Ok(_) => Ok(true),
            Err(e) => Err(PipelineError::Database(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.config.collection
    }

    /// Distance metric used when this client creates a collection.
    pub fn distance(&self) -> DistanceMetric {
        self.config.distance
    }

    pub async fn collection_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == &self.config.collection))
    }

    /// Opens the collection, creating it with `spec` when it does not exist.
    /// An existing collection must match the embedding model and distance.
    pub async fn get_or_create_collection(&self, spec: &CollectionSpec) -> Result<Collection> {
        let name = &self.config.collection;

        if !self.collection_exists().await? {
            info!(
                "Creating collection '{}' (dimension {}, distance {}, model {})",
                name,
                spec.dimension,
                spec.distance.as_str(),
                spec.embedding_model
            );

            self.connection
                .create_empty_table(name, SchemaManager::documents_schema(spec))
                .execute()
                .await
                .map_err(|e| {
                    PipelineError::Database(format!("Failed to create collection {}: {}", name, e))
                })?;
        }

        let collection = self.open(spec).await?;
        SchemaManager::ensure_compatible(&collection.spec, &spec.embedding_model, spec.distance)?;

        if collection.spec.dimension != spec.dimension {
            return Err(PipelineError::Validation(format!(
                "Collection '{}' stores {}-dimensional vectors, got {}",
                name, collection.spec.dimension, spec.dimension
            )));
        }

        Ok(collection)
    }

    /// Opens an existing collection. Fails with `CollectionNotFound` when
    /// nothing has been ingested yet.
    pub async fn get_collection(&self, embedding_model: &str) -> Result<Collection> {
        if !self.collection_exists().await? {
            return Err(PipelineError::CollectionNotFound(
                self.config.collection.clone(),
            ));
        }

        let fallback = CollectionSpec {
            dimension: 0,
            distance: self.config.distance,
            embedding_model: embedding_model.to_string(),
        };

        let collection = self.open(&fallback).await?;
        SchemaManager::ensure_compatible(&collection.spec, embedding_model, self.config.distance)?;
        Ok(collection)
    }

    async fn open(&self, fallback: &CollectionSpec) -> Result<Collection> {
        let name = &self.config.collection;
        let table = self
            .connection
            .open_table(name)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to open collection {}: {}", name, e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to read schema of {}: {}", name, e)))?;

        let spec = SchemaManager::read_spec(&schema, fallback)?;

        Ok(Collection {
            table,
            schema,
            name: name.clone(),
            spec,
        })
    }

    pub async fn document_count(&self) -> Result<u64> {
        if !self.collection_exists().await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(&self.config.collection)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to open collection: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    pub async fn drop_collection(&self) -> Result<bool> {
        if !self.collection_exists().await? {
            return Ok(false);
        }

        self.connection
            .drop_table(&self.config.collection)
            .await
            .map_err(|e| {
                PipelineError::Database(format!(
                    "Failed to drop collection {}: {}",
                    self.config.collection, e
                ))
            })?;

        info!("Dropped collection: {}", self.config.collection);
        Ok(true)
    }
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to count rows: {}", e)))
    }

    /// Nearest stored documents to `embedding`, closest first. Returns every
    /// document when the collection holds fewer than `k`.
    pub async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        if embedding.len() != self.spec.dimension {
            return Err(PipelineError::Validation(format!(
                "Query vector has dimension {}, collection '{}' expects {}",
                embedding.len(),
                self.name,
                self.spec.dimension
            )));
        }

        if k == 0 || self.count().await? == 0 {
            debug!("Collection '{}' is empty, returning no results", self.name);
            return Ok(Vec::new());
        }

        let mut results_stream = self
            .table
            .vector_search(embedding.to_vec())
            .map_err(|e| PipelineError::Database(format!("Failed to create vector search: {}", e)))?
            .column("embedding")
            .distance_type(self.spec.distance.into())
            .limit(k)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Vector search failed: {}", e)))?;

        let mut documents = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                PipelineError::Database(format!("Failed to read result batch: {}", e))
            })?;
            documents.extend(Self::batch_to_documents(&batch)?);
        }

        documents.sort_by(|a, b| {
            a.distance
                .unwrap_or(f32::MAX)
                .total_cmp(&b.distance.unwrap_or(f32::MAX))
        });
        documents.truncate(k);

        debug!("Vector search returned {} results", documents.len());
        Ok(documents)
    }

    fn batch_to_documents(batch: &RecordBatch) -> Result<Vec<RetrievedDocument>> {
        let ids = string_column(batch, "id")?;
        let titles = string_column(batch, "title")?;
        let texts = string_column(batch, "text")?;

        // LanceDB returns distance score in a special column
        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        Ok((0..batch.num_rows())
            .map(|i| {
                RetrievedDocument::new(
                    ids.value(i).to_string(),
                    titles.value(i).to_string(),
                    texts.value(i).to_string(),
                    distances.map(|d| d.value(i)),
                )
            })
            .collect())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

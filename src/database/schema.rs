// file: src/database/schema.rs
// description: LanceDB schema management for the abstracts collection
// reference: https://docs.rs/lancedb

use crate::config::DistanceMetric;
use crate::error::{PipelineError, Result};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::collections::HashMap;
use std::sync::Arc;

pub const METADATA_DISTANCE: &str = "pubmed_rag.distance";
pub const METADATA_EMBEDDING_MODEL: &str = "pubmed_rag.embedding_model";
pub const METADATA_DIMENSION: &str = "pubmed_rag.dimension";

/// Properties fixed when a collection is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub dimension: usize,
    pub distance: DistanceMetric,
    pub embedding_model: String,
}

pub struct SchemaManager;

impl SchemaManager {
    /// Returns the Arrow schema for the collection, with the vector space
    /// properties recorded in the schema metadata.
    pub fn documents_schema(spec: &CollectionSpec) -> SchemaRef {
        let metadata = HashMap::from([
            (METADATA_DISTANCE.to_string(), spec.distance.as_str().to_string()),
            (
                METADATA_EMBEDDING_MODEL.to_string(),
                spec.embedding_model.clone(),
            ),
            (METADATA_DIMENSION.to_string(), spec.dimension.to_string()),
        ]);

        Arc::new(Schema::new_with_metadata(
            vec![
                Field::new("id", DataType::Utf8, false),
                Field::new("title", DataType::Utf8, false),
                Field::new("text", DataType::Utf8, false),
                Field::new("topic", DataType::Utf8, true),
                Field::new("ingested_at", DataType::Utf8, true),
                Field::new(
                    "embedding",
                    DataType::FixedSizeList(
                        Arc::new(Field::new("item", DataType::Float32, true)),
                        spec.dimension as i32,
                    ),
                    false,
                ),
            ],
            metadata,
        ))
    }

    /// Reads the collection properties back from a stored schema.
    ///
    /// The dimension always comes from the embedding column. Distance and
    /// model fall back to `fallback` when the metadata was not preserved.
    pub fn read_spec(schema: &Schema, fallback: &CollectionSpec) -> Result<CollectionSpec> {
        let field = schema.field_with_name("embedding").map_err(|_| {
            PipelineError::Database("Collection has no 'embedding' column".to_string())
        })?;

        let dimension = match field.data_type() {
            DataType::FixedSizeList(_, size) if *size > 0 => *size as usize,
            other => {
                return Err(PipelineError::Database(format!(
                    "Unexpected 'embedding' column type: {}",
                    other
                )));
            }
        };

        let metadata = schema.metadata();

        let distance = match metadata.get(METADATA_DISTANCE) {
            Some(value) => DistanceMetric::parse(value).ok_or_else(|| {
                PipelineError::Database(format!("Unknown stored distance metric '{}'", value))
            })?,
            None => fallback.distance,
        };

        let embedding_model = metadata
            .get(METADATA_EMBEDDING_MODEL)
            .cloned()
            .unwrap_or_else(|| fallback.embedding_model.clone());

        Ok(CollectionSpec {
            dimension,
            distance,
            embedding_model,
        })
    }

    /// Errors when a stored collection was built in a different vector space
    /// than the caller expects.
    pub fn ensure_compatible(stored: &CollectionSpec, expected_model: &str, distance: DistanceMetric) -> Result<()> {
        if stored.embedding_model != expected_model {
            return Err(PipelineError::Config(format!(
                "Collection was built with embedding model '{}' but '{}' is configured",
                stored.embedding_model, expected_model
            )));
        }

        if stored.distance != distance {
            return Err(PipelineError::Config(format!(
                "Collection uses distance '{}' but '{}' is configured",
                stored.distance.as_str(),
                distance.as_str()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CollectionSpec {
        CollectionSpec {
            dimension: 768,
            distance: DistanceMetric::Cosine,
            embedding_model: "text-embedding-004".to_string(),
        }
    }

    #[test]
    fn test_schema_generation() {
        let schema = SchemaManager::documents_schema(&spec());
        assert_eq!(schema.fields().len(), 6);

        let embedding_field = schema.field_with_name("embedding").unwrap();
        assert!(matches!(
            embedding_field.data_type(),
            DataType::FixedSizeList(_, 768)
        ));
        assert_eq!(schema.metadata().get(METADATA_DISTANCE).unwrap(), "cosine");
    }

    #[test]
    fn test_read_spec_round_trips_metadata() {
        let schema = SchemaManager::documents_schema(&spec());
        let fallback = CollectionSpec {
            dimension: 1,
            distance: DistanceMetric::Dot,
            embedding_model: "other".to_string(),
        };
        assert_eq!(SchemaManager::read_spec(&schema, &fallback).unwrap(), spec());
    }

    #[test]
    fn test_read_spec_falls_back_without_metadata() {
        let stored = SchemaManager::documents_schema(&spec());
        let bare = Schema::new(stored.fields().clone());
        let fallback = CollectionSpec {
            dimension: 1,
            distance: DistanceMetric::L2,
            embedding_model: "configured".to_string(),
        };

        let read = SchemaManager::read_spec(&bare, &fallback).unwrap();
        assert_eq!(read.dimension, 768);
        assert_eq!(read.distance, DistanceMetric::L2);
        assert_eq!(read.embedding_model, "configured");
    }

    #[test]
    fn test_ensure_compatible() {
        let stored = spec();
        assert!(SchemaManager::ensure_compatible(&stored, "text-embedding-004", DistanceMetric::Cosine).is_ok());
        assert!(matches!(
            SchemaManager::ensure_compatible(&stored, "embedding-001", DistanceMetric::Cosine),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            SchemaManager::ensure_compatible(&stored, "text-embedding-004", DistanceMetric::L2),
            Err(PipelineError::Config(_))
        ));
    }
}

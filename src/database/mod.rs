// file: src/database/mod.rs
// description: vector store operations module exports
// reference: internal module structure

pub mod client;
pub mod embeddings;
pub mod insert;
pub mod schema;

pub use client::{Collection, LanceDbClient};
pub use embeddings::{Embedder, EmbeddingTask};
pub use insert::UpsertStats;
pub use schema::{CollectionSpec, SchemaManager};

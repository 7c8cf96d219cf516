// file: src/parser/mod.rs
// description: record parsing module exports
// reference: internal module structure

pub mod pubmed;

pub use pubmed::PubMedXmlParser;

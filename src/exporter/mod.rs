// file: src/exporter/mod.rs
// description: report writers for query results

pub mod csv;

pub use self::csv::CsvReportWriter;

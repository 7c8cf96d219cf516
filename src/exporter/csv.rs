// file: src/exporter/csv.rs
// description: csv report of answered questions

use crate::error::Result;
use crate::models::AnswerRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One report line. Field order is the column order.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    question: &'a str,
    answer: &'a str,
    sources: String,
}

impl<'a> From<&'a AnswerRecord> for ReportRow<'a> {
    fn from(record: &'a AnswerRecord) -> Self {
        Self {
            question: &record.question,
            answer: record.answer.as_report_text(),
            sources: record.sources_cell(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    path: PathBuf,
}

impl CsvReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header and one row per record, replacing any existing file.
    pub fn write(&self, records: &[AnswerRecord]) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        if records.is_empty() {
            writer.write_record(["question", "answer", "sources"])?;
        }
        for record in records {
            writer.serialize(ReportRow::from(record))?;
        }
        writer.flush()?;

        info!("Wrote {} answers to {}", records.len(), self.path.display());
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Answer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn records() -> Vec<AnswerRecord> {
        vec![
            AnswerRecord::new(
                "Does caffeine affect sleep?",
                Answer::Generated("Yes, it delays sleep onset [Source 1].".to_string()),
                vec!["Caffeine and sleep".to_string(), "Adenosine, revisited".to_string()],
            ),
            AnswerRecord::new("What is asthma?", Answer::Unavailable, vec![]),
        ]
    }

    #[test]
    fn test_write_report_rows() {
        let dir = TempDir::new().unwrap();
        let writer = CsvReportWriter::new(dir.path().join("reports/out.csv"));

        assert_eq!(writer.write(&records()).unwrap(), 2);

        let mut reader = csv::Reader::from_path(writer.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["question", "answer", "sources"]);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Does caffeine affect sleep?");
        assert_eq!(
            &rows[0][2],
            "[Source 1]: Caffeine and sleep\n[Source 2]: Adenosine, revisited"
        );
        assert_eq!(&rows[1][1], "Error");
        assert_eq!(&rows[1][2], "");
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale content\nmore\nlines\n").unwrap();

        let writer = CsvReportWriter::new(&path);
        writer.write(&records()[..1]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 1);
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");

        CsvReportWriter::new(&path).write(&[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "question,answer,sources\n");
    }
}

// file: src/parser/pubmed.rs
// description: PubMed efetch XML parsing with quick-xml
// reference: https://docs.rs/quick-xml

use crate::error::{PipelineError, Result};
use crate::models::{Article, RecordOutcome, SkipReason};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

/// Parses a `PubmedArticleSet` document into one outcome per
/// `PubmedArticle`.
///
/// Required fields:
/// * `MedlineCitation/PMID`
/// * `MedlineCitation/Article/ArticleTitle` (inline markup is flattened)
/// * `MedlineCitation/Article/Abstract/AbstractText` (first paragraph)
///
/// A record missing any of them becomes `RecordOutcome::Skipped`.
pub struct PubMedXmlParser;

#[derive(Debug, Default)]
struct RecordBuilder {
    pmid: Option<String>,
    title: String,
    abstract_paragraphs: Vec<String>,
    current_paragraph: String,
}

impl RecordBuilder {
    fn finish(self) -> RecordOutcome {
        let pmid = self
            .pmid
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let Some(pmid) = pmid else {
            return RecordOutcome::Skipped {
                pmid: None,
                reason: SkipReason::MissingPmid,
            };
        };

        let title = collapse_whitespace(&self.title);
        if title.is_empty() {
            return RecordOutcome::Skipped {
                pmid: Some(pmid),
                reason: SkipReason::MissingTitle,
            };
        }

        let abstract_text = self
            .abstract_paragraphs
            .first()
            .map(|p| collapse_whitespace(p))
            .unwrap_or_default();
        if abstract_text.is_empty() {
            return RecordOutcome::Skipped {
                pmid: Some(pmid),
                reason: SkipReason::MissingAbstract,
            };
        }

        RecordOutcome::Parsed(Article::new(pmid, title, abstract_text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pmid,
    Title,
    Abstract,
}

impl PubMedXmlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, xml: &str) -> Result<Vec<RecordOutcome>> {
        let mut reader = Reader::from_str(xml);

        let mut outcomes = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<RecordBuilder> = None;
        // (field, depth at which the field element was opened)
        let mut active: Option<(Field, usize)> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf);
            let position = reader.buffer_position();

            match event.map_err(|e| PipelineError::Xml(format!("at byte {}: {}", position, e)))? {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

                    if name == "PubmedArticle" {
                        current = Some(RecordBuilder::default());
                    } else if current.is_some() && active.is_none() {
                        active = field_for(&path, &name).map(|field| (field, path.len()));
                    }

                    path.push(name);
                }
                Event::End(ref e) => {
                    path.pop();

                    if let Some((field, depth)) = active {
                        if depth == path.len() {
                            active = None;
                            if field == Field::Abstract {
                                if let Some(builder) = current.as_mut() {
                                    let paragraph = std::mem::take(&mut builder.current_paragraph);
                                    builder.abstract_paragraphs.push(paragraph);
                                }
                            }
                        }
                    }

                    if e.name().as_ref() == b"PubmedArticle" {
                        if let Some(builder) = current.take() {
                            outcomes.push(builder.finish());
                        }
                    }
                }
                Event::Text(ref e) => {
                    if let (Some(builder), Some((field, _))) = (current.as_mut(), active) {
                        let text = e
                            .unescape()
                            .map_err(|err| PipelineError::Xml(err.to_string()))?;
                        append_text(builder, field, &text);
                    }
                }
                Event::CData(ref e) => {
                    if let (Some(builder), Some((field, _))) = (current.as_mut(), active) {
                        let text = String::from_utf8_lossy(e).into_owned();
                        append_text(builder, field, &text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        debug!("Parsed {} PubMed records", outcomes.len());
        Ok(outcomes)
    }
}

impl Default for PubMedXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Which required field, if any, an element named `name` opens when it
/// appears under `path`.
fn field_for(path: &[String], name: &str) -> Option<Field> {
    let parent = path.last().map(String::as_str);
    let grandparent = path.len().checked_sub(2).map(|i| path[i].as_str());

    match (name, parent, grandparent) {
        ("PMID", Some("MedlineCitation"), _) => Some(Field::Pmid),
        ("ArticleTitle", Some("Article"), _) => Some(Field::Title),
        ("AbstractText", Some("Abstract"), Some("Article")) => Some(Field::Abstract),
        _ => None,
    }
}

fn append_text(builder: &mut RecordBuilder, field: Field, text: &str) {
    match field {
        Field::Pmid => builder.pmid.get_or_insert_with(String::new).push_str(text),
        Field::Title => builder.title.push_str(text),
        Field::Abstract => builder.current_paragraph.push_str(text),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

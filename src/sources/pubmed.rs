// file: src/sources/pubmed.rs
// description: NCBI E-utilities client for PubMed search and record fetch
// reference: https://www.ncbi.nlm.nih.gov/books/NBK25499/

use crate::config::PubMedConfig;
use crate::error::{PipelineError, Result};
use crate::models::RecordOutcome;
use crate::parser::PubMedXmlParser;
use crate::sources::LiteratureSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

pub struct PubMedClient {
    client: Client,
    config: PubMedConfig,
    parser: PubMedXmlParser,
}

impl PubMedClient {
    pub fn new(config: PubMedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            parser: PubMedXmlParser::new(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.config.tool.clone()),
            ("email", self.config.email.clone()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    async fn get_checked(&self, url: &str, params: &[(&'static str, String)]) -> Result<reqwest::Response> {
        let response = self.client.get(url).query(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Literature(format!(
                "PubMed request failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<String>> {
        info!("Searching PubMed for term {}", topic);

        let mut params = self.base_params();
        params.push(("term", topic.to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("retmode", "json".to_string()));

        let response = self.get_checked(&self.endpoint("esearch.fcgi"), &params).await?;
        let body: ESearchResponse = response.json().await?;

        if let Some(error) = body.esearchresult.error {
            return Err(PipelineError::Literature(format!("esearch error: {}", error)));
        }

        let mut ids = body.esearchresult.idlist;
        ids.truncate(max_results);

        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<RecordOutcome>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        info!("Found {} articles. Fetching abstracts", ids.len());

        let mut params = self.base_params();
        params.push(("id", ids.join(",")));
        params.push(("rettype", "xml".to_string()));
        params.push(("retmode", "xml".to_string()));

        let response = self.get_checked(&self.endpoint("efetch.fcgi"), &params).await?;
        let xml = response.text().await?;

        self.parser.parse(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::SkipReason;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PubMedClient {
        let mut config = Config::default_config().pubmed;
        config.base_url = server.uri();
        config.api_key = Some("ncbi-key".to_string());
        PubMedClient::new(config).unwrap()
    }

    const EFETCH_BODY: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation><PMID>111</PMID>
      <Article><ArticleTitle>Pneumonia outcomes</ArticleTitle>
        <Abstract><AbstractText>Outcomes improved.</AbstractText></Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation><PMID>222</PMID>
      <Article><ArticleTitle>Letter without abstract</ArticleTitle></Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[tokio::test]
    async fn test_search_sends_term_and_retmax() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("db", "pubmed"))
            .and(query_param("term", "pneumonia"))
            .and(query_param("retmax", "3"))
            .and(query_param("retmode", "json"))
            .and(query_param("api_key", "ncbi-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "header": {"type": "esearch", "version": "0.3"},
                "esearchresult": {"count": "2", "retmax": "2", "idlist": ["111", "222"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client_for(&server).search("pneumonia", 3).await.unwrap();
        assert_eq!(ids, vec!["111".to_string(), "222".to_string()]);
    }

    #[tokio::test]
    async fn test_search_reports_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"ERROR": "Invalid query"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).search("((", 3).await.unwrap_err();
        assert!(matches!(err, PipelineError::Literature(_)));
    }

    #[tokio::test]
    async fn test_fetch_parses_and_skips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "111,222"))
            .and(query_param("rettype", "xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EFETCH_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["111".to_string(), "222".to_string()];
        let outcomes = client_for(&server).fetch(&ids).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].article().unwrap().title, "Pneumonia outcomes");
        assert_eq!(
            outcomes[1],
            RecordOutcome::Skipped {
                pmid: Some("222".to_string()),
                reason: SkipReason::MissingAbstract
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_with_no_ids_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let outcomes = client_for(&server).fetch(&[]).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let err = client_for(&server).search("pneumonia", 3).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}

use crate::config::{FetchConfig, Region, SourceLocator};
use crate::error::{ConfigError, FetchCause, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, region: &Region) -> Result<Vec<RawRow>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name =
                HeaderName::from_bytes(k.as_bytes()).map_err(|err| ConfigError::InvalidHeader {
                    name: k.clone(),
                    reason: err.to_string(),
                })?;
            let value = HeaderValue::from_str(v).map_err(|err| ConfigError::InvalidHeader {
                name: k.clone(),
                reason: err.to_string(),
            })?;
            headers.insert(name, value);
        }

        if let Some(user_agent) = &config.user_agent {
            let value =
                HeaderValue::from_str(user_agent).map_err(|err| ConfigError::InvalidHeader {
                    name: USER_AGENT.as_str().to_string(),
                    reason: err.to_string(),
                })?;
            headers.insert(USER_AGENT, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &Url) -> Result<String, FetchCause> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, region: &Region) -> Result<Vec<RawRow>, FetchError> {
        let text = match &region.source_locator {
            SourceLocator::Http(url) => self.fetch_http(url).await,
            SourceLocator::File(path) => read_file(path).await,
        }
        .map_err(|cause| FetchError::new(&region.id, cause))?;

        let rows = decode_rows(&text).map_err(|cause| FetchError::new(&region.id, cause))?;

        info!(
            region = %region.id,
            locator = %region.source_locator,
            bytes = text.len(),
            rows = rows.len(),
            "fetched feed"
        );
        Ok(rows)
    }
}

async fn read_file(path: &Path) -> Result<String, FetchCause> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchCause::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Splits a header-less CSV payload into rows. Blank lines are dropped;
/// short rows are kept and left for the row parser to reject.
pub fn decode_rows(text: &str) -> Result<Vec<RawRow>, FetchCause> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(FetchCause::EmptyPayload);
    }
    if text.trim_start().starts_with('<') {
        return Err(FetchCause::Malformed(
            "payload looks like markup, not csv".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FetchCause::Malformed(err.to_string()))?;
        let row: RawRow = record.iter().collect();
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(FetchCause::EmptyPayload);
    }

    debug!(rows = rows.len(), "decoded csv payload");
    Ok(rows)
}

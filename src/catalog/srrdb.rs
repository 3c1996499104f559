//! srrDB HTTP client

use super::{CatalogMatch, RemoteCatalog, SearchQuery};
use crate::config::CatalogConfig;
use crate::error::{Error, PipelineError, Result};
use crate::utils::entry_file_name;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest response body kept in a [`PipelineError::NetworkFailure`]
const MAX_ERROR_BODY: usize = 512;

const USER_AGENT: &str = concat!("srrdb-verify/", env!("CARGO_PKG_VERSION"));

/// `resultsCount` is a number on some deployments and a string on others
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultsCount {
    Number(u64),
    Text(String),
}

impl ResultsCount {
    fn value(&self) -> Option<u64> {
        match self {
            ResultsCount::Number(n) => Some(*n),
            ResultsCount::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultsCount", default)]
    results_count: Option<ResultsCount>,
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    release: Option<String>,
}

/// Client for the srrDB search and download API
///
/// Every request is bounded by [`CatalogConfig::timeout`]. Releases with
/// `.XXX.` in their name are looked up on the adult catalog instead.
pub struct SrrDbCatalog {
    client: reqwest::Client,
    config: CatalogConfig,
}

impl SrrDbCatalog {
    /// Create a client for the configured catalog
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn base_for(&self, release: &str) -> &str {
        self.config.base_for(release).trim_end_matches('/')
    }

    async fn failure(url: &str, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        PipelineError::NetworkFailure {
            url: url.to_string(),
            status,
            body,
        }
        .into()
    }
}

/// File name a downloaded record is stored under: last URL segment plus `.srr`
fn record_file_name(download_url: &str) -> Option<String> {
    let url = url::Url::parse(download_url).ok()?;
    let last = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(last).ok()?;
    let name = entry_file_name(&decoded);
    (!name.is_empty() && name != "." && name != "..").then(|| format!("{name}.srr"))
}

#[async_trait]
impl RemoteCatalog for SrrDbCatalog {
    async fn search(&self, release: &str, query: &SearchQuery) -> Result<Option<CatalogMatch>> {
        let base = self.base_for(release);
        let url = format!("{}/api/search/{}", base, query.path_segment());
        info!(%query, "searching srrDB");
        debug!(%url, "search request");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(&url, response).await);
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        let releases: Vec<&str> = parsed
            .results
            .iter()
            .filter_map(|r| r.release.as_deref())
            .filter(|r| !r.is_empty())
            .collect();

        // Trust whichever of the two counts is larger
        let count = parsed
            .results_count
            .as_ref()
            .and_then(ResultsCount::value)
            .unwrap_or(0)
            .max(releases.len() as u64);

        if count > 1 {
            return Err(PipelineError::AmbiguousMatch {
                query: query.to_string(),
                count,
            }
            .into());
        }

        let Some(found) = releases.first() else {
            info!(%query, "no srrDB match");
            return Ok(None);
        };

        let download_url = format!("{}/download/srr/{}", base, urlencoding::encode(found));
        info!(%query, release = %found, "srrDB match");

        Ok(Some(CatalogMatch {
            release: found.to_string(),
            download_url,
        }))
    }

    async fn download(&self, candidate: &CatalogMatch, dest_dir: &Path) -> Result<PathBuf> {
        let url = &candidate.download_url;
        let file_name = record_file_name(url).ok_or_else(|| {
            Error::Other(format!("cannot derive a record name from {url:?}"))
        })?;

        info!(%url, "downloading SRR");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(url, response).await);
        }

        let bytes = response.bytes().await?;
        let target = dest_dir.join(file_name);
        tokio::fs::write(&target, &bytes).await?;
        debug!(path = ?target, size = bytes.len(), "SRR written");

        Ok(target)
    }

    fn name(&self) -> &'static str {
        "srrdb"
    }
}

//! Album search + artwork download client

use serde::Deserialize;
use sleeve_proto::config::ArtworkConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ArtworkError;

/// Search response. Only the fields we read.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultCount")]
    result_count: u32,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

/// Everything one lookup needs, owned so it can move into a task.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub artist: String,
    pub album: String,
    pub destination: PathBuf,
}

/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct RemoteArtworkFetcher {
    client: reqwest::Client,
    search_url: String,
    low_res_token: String,
    high_res_token: String,
}

impl RemoteArtworkFetcher {
    pub fn new(config: &ArtworkConfig) -> Result<Self, ArtworkError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            low_res_token: config.low_res_token.clone(),
            high_res_token: config.high_res_token.clone(),
        })
    }

    /// Search, upgrade the artwork URL, download, and write the image to
    /// `request.destination`.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, ArtworkError> {
        let low_res = self.search(&request.artist, &request.album).await?;
        let url = upgrade_resolution(&low_res, &self.low_res_token, &self.high_res_token);
        debug!("artwork: downloading {}", url);
        let bytes = self.download(&url).await?;
        persist(&request.destination, &bytes).await?;
        Ok(request.destination.clone())
    }

    /// Returns the low-resolution artwork URL of the best album match.
    async fn search(&self, artist: &str, album: &str) -> Result<String, ArtworkError> {
        let term = format!("{} {}", artist, album);
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("term", term.as_str()), ("entity", "album"), ("limit", "1")])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArtworkError::Status(response.status()));
        }

        let body = response.bytes().await?;
        parse_search(&body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ArtworkError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ArtworkError::Status(response.status()));
        }

        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            return Err(ArtworkError::MalformedResponse("empty image body".into()));
        }
        Ok(data)
    }
}

fn parse_search(body: &[u8]) -> Result<String, ArtworkError> {
    let search: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| ArtworkError::MalformedResponse(e.to_string()))?;

    if search.result_count == 0 {
        return Err(ArtworkError::ZeroResults);
    }

    search
        .results
        .into_iter()
        .next()
        .and_then(|r| r.artwork_url_100)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ArtworkError::MalformedResponse("result has no artworkUrl100".into()))
}

/// Swap the size marker in an artwork URL, e.g. `100x100bb.jpg` to
/// `600x600bb.jpg`. URLs without the marker are returned unchanged.
pub fn upgrade_resolution(url: &str, low: &str, high: &str) -> String {
    if low.is_empty() {
        return url.to_string();
    }
    url.replacen(low, high, 1)
}

/// Write through a sibling `.part` file so a crash never leaves a truncated
/// image under the final name.
async fn persist(destination: &Path, bytes: &[u8]) -> Result<(), ArtworkError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = destination.with_extension("jpg.part");
    tokio::fs::write(&partial, bytes).await?;
    if let Err(e) = tokio::fs::rename(&partial, destination).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

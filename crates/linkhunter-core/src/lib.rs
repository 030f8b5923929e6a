//! Backend-agnostic types, traits and the URL relevance ranker for `linkhunter`.
//!
//! Everything in this crate is pure: no network, no filesystem. IO lives in
//! `linkhunter-local`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod page;
pub mod rank;
pub mod tokenize;

pub use page::{
    build_report, build_report_with, count_urls, filter_scope, sort_by_count, LinkScope,
    PageReport, PageReportOptions, RowOrder, UrlCount,
};
pub use rank::{
    corpus_stats, rank, rank_detailed, CorpusStats, InvalidUrl, Ranking, RelevanceRanker,
    ScoredUrl,
};
pub use tokenize::{tokenize, Tokenizer, DEFAULT_STOPWORDS};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("archive failed: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

/// Source of page HTML.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub urls: Vec<UrlCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote sink for a selection of page links.
#[async_trait::async_trait]
pub trait ArchiveBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn archive(&self, req: &ArchiveRequest) -> Result<ArchiveResponse>;
}

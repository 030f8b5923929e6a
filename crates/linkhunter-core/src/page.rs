//! Per-page link lists: scope filters, occurrence counts and the combined report.

use crate::rank::RelevanceRanker;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlCount {
    pub url: String,
    pub count: u64,
}

/// Which links of a page to keep, relative to the page's own host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LinkScope {
    #[default]
    All,
    SameDomain,
    External,
}

impl LinkScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "same-domain" | "same_domain" | "internal" => Some(Self::SameDomain),
            "external" => Some(Self::External),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::SameDomain => "same-domain",
            Self::External => "external",
        }
    }

    /// A URL without a host (`mailto:`, `javascript:`, unparseable) never
    /// shares the page's host, so it counts as external.
    pub fn matches(&self, url: &str, page_host: &str) -> bool {
        let host = host_of(url);
        match self {
            Self::All => true,
            Self::SameDomain => host.as_deref() == Some(page_host),
            Self::External => host.as_deref() != Some(page_host),
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// How report rows are ordered after counting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// First appearance in the (possibly ranked) link list.
    FirstSeen,
    /// Highest count first; ties keep first-seen order.
    #[default]
    Count,
}

impl RowOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-seen" | "first_seen" | "page" | "rank" => Some(Self::FirstSeen),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageReportOptions {
    pub scope: LinkScope,
    /// Rank links by TF-IDF relevance before counting.
    pub tfidf: bool,
    pub order: RowOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageReport {
    pub page_url: String,
    /// Link occurrences after the scope filter.
    pub total_links: usize,
    pub rows: Vec<UrlCount>,
    pub warnings: Vec<String>,
}

/// One row per distinct URL, in order of first appearance.
pub fn count_urls<S: AsRef<str>>(urls: &[S]) -> Vec<UrlCount> {
    let mut pos: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<UrlCount> = Vec::new();
    for u in urls {
        let u = u.as_ref();
        match pos.get(u) {
            Some(&i) => rows[i].count += 1,
            None => {
                pos.insert(u, rows.len());
                rows.push(UrlCount {
                    url: u.to_string(),
                    count: 1,
                });
            }
        }
    }
    rows
}

pub fn sort_by_count(rows: &mut [UrlCount]) {
    rows.sort_by(|a, b| b.count.cmp(&a.count));
}

pub fn filter_scope<S: AsRef<str>>(
    urls: &[S],
    page_url: &str,
    scope: LinkScope,
) -> Result<Vec<String>> {
    if scope == LinkScope::All {
        return Ok(urls.iter().map(|u| u.as_ref().to_string()).collect());
    }
    let page_host = host_of(page_url)
        .ok_or_else(|| Error::InvalidUrl(format!("page url has no host: {page_url}")))?;
    Ok(urls
        .iter()
        .map(|u| u.as_ref())
        .filter(|u| scope.matches(u, &page_host))
        .map(str::to_string)
        .collect())
}

/// Filter, optionally rank, then count the links found on `page_url`.
pub fn build_report<S: AsRef<str>>(
    page_url: &str,
    urls: &[S],
    opts: &PageReportOptions,
) -> Result<PageReport> {
    build_report_with(&RelevanceRanker::new(), page_url, urls, opts)
}

pub fn build_report_with<S: AsRef<str>>(
    ranker: &RelevanceRanker,
    page_url: &str,
    urls: &[S],
    opts: &PageReportOptions,
) -> Result<PageReport> {
    let mut links = filter_scope(urls, page_url, opts.scope)?;
    let mut warnings = Vec::new();

    if opts.tfidf {
        let ranking = ranker.rank_detailed(&links);
        for bad in &ranking.invalid {
            warnings.push(format!("invalid_url: index={} {}", bad.index, bad.error));
        }
        links = ranking.into_urls();
    }

    let mut rows = count_urls(&links);
    if opts.order == RowOrder::Count {
        sort_by_count(&mut rows);
    }

    Ok(PageReport {
        page_url: page_url.to_string(),
        total_links: links.len(),
        rows,
        warnings,
    })
}

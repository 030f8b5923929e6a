//! URL tokenizer: host labels, path segments and query pairs.

use crate::{Error, Result};
use std::collections::BTreeSet;
use url::form_urlencoded;

/// Tokens dropped from every URL, compared case-insensitively.
pub const DEFAULT_STOPWORDS: &[&str] = &["http", "https", "www", "com", "net", "org"];

/// Splits a URL into its structural tokens and drops stopwords.
///
/// Token order is host labels, then non-empty path segments, then one
/// `key=value` token per query pair. Surviving tokens keep their casing.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Lower-cased.
    stopwords: BTreeSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Default stopwords plus `extra`.
    pub fn with_stopwords<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut t = Self::new();
        for s in extra {
            let s = s.as_ref().trim();
            if !s.is_empty() {
                t.stopwords.insert(s.to_lowercase());
            }
        }
        t
    }

    pub fn stopwords(&self) -> impl Iterator<Item = &str> {
        self.stopwords.iter().map(|s| s.as_str())
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(&token.to_lowercase())
    }

    pub fn tokenize(&self, raw: &str) -> Result<Vec<String>> {
        let url = url::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
        Ok(self.tokenize_parsed(&url))
    }

    pub fn tokenize_parsed(&self, url: &url::Url) -> Vec<String> {
        structural_tokens(url)
            .into_iter()
            .filter(|t| !self.is_stopword(t))
            .collect()
    }
}

/// Tokenize with the default stopword set.
pub fn tokenize(raw: &str) -> Result<Vec<String>> {
    Tokenizer::new().tokenize(raw)
}

fn structural_tokens(url: &url::Url) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(host) = url.host_str() {
        out.extend(
            host.split('.')
                .filter(|label| !label.is_empty())
                .map(str::to_string),
        );
    }

    out.extend(
        url.path()
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::to_string),
    );

    // One token per pair, re-encoded so `a%20b` and `a+b` collapse to the same token.
    for (k, v) in url.query_pairs() {
        let pair = form_urlencoded::Serializer::new(String::new())
            .append_pair(&k, &v)
            .finish();
        out.push(pair);
    }

    out
}

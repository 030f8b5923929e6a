//! TF-IDF relevance ranking over the URLs of one page.
//!
//! Each URL occurrence is one document, so a link repeated on a page inflates
//! both the term frequency and the document frequency of its tokens:
//!
//! - `weight(t) = (tf(t) / N) * ln(N / max(df(t), 1))`
//! - `score(url) = sum of weight(t) over the url's token sequence`
//!
//! URLs are returned stably sorted by descending score. A URL that fails to
//! parse contributes no tokens and scores 0; it is never dropped.

use crate::tokenize::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredUrl {
    pub url: String,
    pub score: f64,
    pub tokens: Vec<String>,
}

/// A corpus entry that could not be tokenized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidUrl {
    /// Position in the input corpus.
    pub index: usize,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ranking {
    pub ranked: Vec<ScoredUrl>,
    /// In input order.
    pub invalid: Vec<InvalidUrl>,
}

impl Ranking {
    pub fn urls(&self) -> Vec<String> {
        self.ranked.iter().map(|s| s.url.clone()).collect()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.ranked.into_iter().map(|s| s.url).collect()
    }
}

/// Frequency tables for one corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CorpusStats {
    pub documents: usize,
    pub term_frequency: BTreeMap<String, usize>,
    pub document_frequency: BTreeMap<String, usize>,
    pub weights: BTreeMap<String, f64>,
}

impl CorpusStats {
    pub fn weight(&self, token: &str) -> f64 {
        self.weights.get(token).copied().unwrap_or(0.0)
    }

    /// Sum over the sequence, so a token repeated within one URL counts each time.
    pub fn score<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        tokens
            .iter()
            .fold(0.0_f64, |acc, t| acc + self.weight(t.as_ref()))
    }
}

struct TokenizedCorpus {
    /// Token sequence per distinct URL string.
    unique: Vec<Vec<String>>,
    /// Index into `unique` for every document, in input order.
    docs: Vec<usize>,
    invalid: Vec<InvalidUrl>,
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceRanker {
    tokenizer: Tokenizer,
}

impl RelevanceRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn rank<S: AsRef<str>>(&self, urls: &[S]) -> Vec<String> {
        self.rank_detailed(urls).into_urls()
    }

    pub fn rank_detailed<S: AsRef<str>>(&self, urls: &[S]) -> Ranking {
        if urls.is_empty() {
            return Ranking::default();
        }
        let corpus = self.tokenize_corpus(urls);
        let stats = Self::stats_for(&corpus);

        let mut ranked: Vec<ScoredUrl> = corpus
            .docs
            .iter()
            .zip(urls)
            .map(|(&slot, url)| {
                let tokens = &corpus.unique[slot];
                ScoredUrl {
                    url: url.as_ref().to_string(),
                    score: stats.score(tokens),
                    tokens: tokens.clone(),
                }
            })
            .collect();

        // `sort_by` is stable: equal scores keep input order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ranking {
            ranked,
            invalid: corpus.invalid,
        }
    }

    pub fn corpus_stats<S: AsRef<str>>(&self, urls: &[S]) -> CorpusStats {
        Self::stats_for(&self.tokenize_corpus(urls))
    }

    fn tokenize_corpus<S: AsRef<str>>(&self, urls: &[S]) -> TokenizedCorpus {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<Vec<String>> = Vec::new();
        let mut errors: Vec<Option<String>> = Vec::new();
        let mut docs = Vec::with_capacity(urls.len());
        let mut invalid = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            let slot = *slots.entry(url).or_insert_with(|| {
                let (tokens, err) = match self.tokenizer.tokenize(url) {
                    Ok(t) => (t, None),
                    Err(e) => (Vec::new(), Some(e.to_string())),
                };
                unique.push(tokens);
                errors.push(err);
                unique.len() - 1
            });
            if let Some(err) = &errors[slot] {
                invalid.push(InvalidUrl {
                    index,
                    url: url.to_string(),
                    error: err.clone(),
                });
            }
            docs.push(slot);
        }

        TokenizedCorpus {
            unique,
            docs,
            invalid,
        }
    }

    fn stats_for(corpus: &TokenizedCorpus) -> CorpusStats {
        let n = corpus.docs.len();
        let mut term_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for &slot in &corpus.docs {
            let tokens = &corpus.unique[slot];
            for t in tokens {
                *term_frequency.entry(t.clone()).or_insert(0) += 1;
            }
            let distinct: BTreeSet<&String> = tokens.iter().collect();
            for t in distinct {
                *document_frequency.entry(t.clone()).or_insert(0) += 1;
            }
        }

        let mut weights = BTreeMap::new();
        if n > 0 {
            let n_f = n as f64;
            for (t, &tf) in &term_frequency {
                let df = document_frequency.get(t).copied().unwrap_or(0).max(1);
                let tf_norm = tf as f64 / n_f;
                let idf = (n_f / df as f64).ln();
                weights.insert(t.clone(), tf_norm * idf);
            }
        }

        CorpusStats {
            documents: n,
            term_frequency,
            document_frequency,
            weights,
        }
    }
}

/// Rank with the default tokenizer.
pub fn rank<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    RelevanceRanker::new().rank(urls)
}

pub fn rank_detailed<S: AsRef<str>>(urls: &[S]) -> Ranking {
    RelevanceRanker::new().rank_detailed(urls)
}

pub fn corpus_stats<S: AsRef<str>>(urls: &[S]) -> CorpusStats {
    RelevanceRanker::new().corpus_stats(urls)
}

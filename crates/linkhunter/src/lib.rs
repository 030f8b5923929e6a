//! Public facade crate for `linkhunter`.
//!
//! This crate contains no IO. It re-exports the URL tokenizer, the TF-IDF
//! relevance ranker and the page-report types from `linkhunter-core`.

pub use linkhunter_core::*;

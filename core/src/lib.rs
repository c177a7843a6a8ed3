//! Bag-of-words TF-IDF keyword ranking over short text documents.
//!
//! Documents are normalized (diacritics stripped, lower-cased, split on
//! whitespace), filtered through a stop-word list, counted, weighted with
//! smoothed TF-IDF and L2-normalized per document. Queries go through the same
//! normalizer and score each document by summing its weights over the query
//! term columns.

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod normalize;
mod parallel;
pub mod persist;
pub mod search;
pub mod shared;
pub mod stopwords;
pub mod tfidf;
pub mod vocab;

pub use config::IndexConfig;
pub use document::{Document, DocumentRecord};
pub use error::RankError;
pub use index::{DocId, Posting, RankingIndex, TermId};
pub use search::{explain_query, search, search_page, QueryTerm, SearchHit, SearchOptions, SearchPage};
pub use shared::SharedIndex;
pub use stopwords::{StopWordSet, StopWordSource};

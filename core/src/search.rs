//! Query-time scoring.
//!
//! A document's score is the cumulative sum of its weights in every resolved
//! query term column. Repeating a term in the query adds its column again.

use crate::config::{DEFAULT_LIMIT, DEFAULT_SCORE_FLOOR};
use crate::error::{RankError, Result};
use crate::index::RankingIndex;
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub limit: usize,
    /// Hits scoring strictly below this are dropped.
    pub score_floor: f32,
    /// Keep only documents containing every resolved query term.
    pub require_all_terms: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, score_floor: DEFAULT_SCORE_FLOOR, require_all_terms: false }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_score_floor(mut self, score_floor: f32) -> Self {
        self.score_floor = score_floor;
        self
    }

    pub fn with_all_terms(mut self, require_all_terms: bool) -> Self {
        self.require_all_terms = require_all_terms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f32,
}

/// How a single normalized query token was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryTerm {
    Resolved { token: String, term_id: TermId },
    StopWord { token: String },
    Unknown { token: String },
}

/// A truncated ranking plus the number of hits that cleared the floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub total_hits: usize,
}

/// Rank documents for `query`, best first, ties broken by ascending doc id.
pub fn search(index: &RankingIndex, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
    search_page(index, query, options).map(|page| page.hits)
}

/// Like [`search`], also reporting how many hits existed before truncation.
pub fn search_page(index: &RankingIndex, query: &str, options: &SearchOptions) -> Result<SearchPage> {
    if options.limit == 0 {
        return Err(RankError::InvalidLimit);
    }

    let term_ids: Vec<TermId> = index
        .normalizer()
        .normalize(query)
        .iter()
        .filter_map(|token| index.vocabulary_lookup(token))
        .collect();
    if term_ids.is_empty() {
        return Ok(SearchPage { hits: Vec::new(), total_hits: 0 });
    }

    let scores = accumulate(index, &term_ids);
    let matched = options.require_all_terms.then(|| matched_terms(index, &term_ids));

    // Documents no query column touched are never candidates, whatever the floor.
    let mut hits: Vec<SearchHit> = scores
        .into_iter()
        .enumerate()
        .filter_map(|(doc, score)| score.map(|s| (doc, s)))
        .filter(|(doc, _)| matched.as_ref().map_or(true, |(counts, needed)| counts[*doc] == *needed))
        .filter(|(_, score)| *score >= options.score_floor)
        .map(|(doc, score)| SearchHit { doc_id: doc as DocId, score })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
    let total_hits = hits.len();
    hits.truncate(options.limit);
    tracing::debug!(query, terms = term_ids.len(), total_hits, hits = hits.len(), "search");
    Ok(SearchPage { hits, total_hits })
}

/// Cumulative score per document; `None` where no posting was added.
fn accumulate(index: &RankingIndex, term_ids: &[TermId]) -> Vec<Option<f32>> {
    let mut scores = vec![None; index.document_count()];
    for &tid in term_ids {
        for posting in index.column(tid) {
            *scores[posting.doc_id as usize].get_or_insert(0.0) += posting.weight;
        }
    }
    scores
}

/// Per document, how many distinct query terms it contains, plus the number needed.
fn matched_terms(index: &RankingIndex, term_ids: &[TermId]) -> (Vec<usize>, usize) {
    let mut distinct = term_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let mut counts = vec![0usize; index.document_count()];
    for &tid in &distinct {
        for posting in index.column(tid) {
            counts[posting.doc_id as usize] += 1;
        }
    }
    (counts, distinct.len())
}

/// Classify every normalized query token against the index.
pub fn explain_query(index: &RankingIndex, query: &str) -> Vec<QueryTerm> {
    index
        .normalizer()
        .normalize(query)
        .into_iter()
        .map(|token| match index.vocabulary_lookup(&token) {
            Some(term_id) => QueryTerm::Resolved { token, term_id },
            None if index.stop_words().contains(&token) => QueryTerm::StopWord { token },
            None => QueryTerm::Unknown { token },
        })
        .collect()
}

use crate::config::IndexConfig;
use crate::document::Document;
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::search::{self, SearchHit, SearchOptions, SearchPage};
use crate::stopwords::StopWordSet;
use crate::tfidf::{self, WeightMatrix};
use crate::vocab::{self, Vocabulary};
use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // normalized tf-idf weight
}

/// A built, read-only keyword index. Rebuilding produces a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingIndex {
    documents: Vec<Document>,
    vocabulary: Vocabulary,
    weights: WeightMatrix,
    stop_words: StopWordSet,
    normalizer: Normalizer,
    config: IndexConfig,
}

impl RankingIndex {
    /// Load the configured stop words and build the index.
    pub fn build(documents: Vec<Document>, config: &IndexConfig) -> Result<Self> {
        let stop_words = StopWordSet::load(&config.stop_word_source)?;
        Self::build_with_stop_words(documents, stop_words, config)
    }

    /// Build with an already loaded stop-word set. Document ids are reassigned
    /// to their position so that row `i` is always `documents[i]`.
    pub fn build_with_stop_words(
        mut documents: Vec<Document>,
        stop_words: StopWordSet,
        config: &IndexConfig,
    ) -> Result<Self> {
        for (i, doc) in documents.iter_mut().enumerate() {
            doc.id = i as DocId;
        }
        let normalizer = Normalizer::new(config.token_pattern);

        tracing::debug!(docs = documents.len(), stop_words = stop_words.len(), "building vocabulary");
        let (vocabulary, counts) = vocab::build(&documents, &stop_words, &normalizer)?;
        let weights = tfidf::transform(&counts, &config.tfidf);
        tracing::info!(num_docs = documents.len(), num_terms = vocabulary.len(), "ranking index built");

        Ok(Self {
            documents,
            vocabulary,
            weights,
            stop_words,
            normalizer,
            config: config.clone(),
        })
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id as usize)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vocabulary_lookup(&self, term: &str) -> Option<TermId> {
        self.vocabulary.lookup(term)
    }

    /// Non-zero weights of one term, as `(doc_id, weight)` postings sorted by doc_id.
    pub fn column(&self, term_id: TermId) -> &[Posting] {
        self.weights.column(term_id)
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn stop_words(&self) -> &StopWordSet {
        &self.stop_words
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        search::search(self, query, options)
    }

    pub fn search_page(&self, query: &str, options: &SearchOptions) -> Result<SearchPage> {
        search::search_page(self, query, options)
    }
}

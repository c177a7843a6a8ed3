use crate::document::Document;
use crate::error::{RankError, Result};
use crate::normalize::Normalizer;
use crate::parallel::map_rows;
use crate::stopwords::StopWordSet;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Frozen term <-> column mapping. Terms are numbered in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    dictionary: HashMap<String, TermId>,
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let dictionary = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        Self { terms, dictionary }
    }

    pub fn lookup(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &str)> {
        self.terms.iter().enumerate().map(|(i, t)| (i as TermId, t.as_str()))
    }
}

/// Raw term counts, one sparse row per document, each row sorted by term id.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    rows: Vec<Vec<(TermId, u32)>>,
    n_terms: usize,
}

impl CountMatrix {
    pub fn rows(&self) -> &[Vec<(TermId, u32)>] {
        &self.rows
    }

    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    /// Number of documents containing each term at least once.
    pub fn doc_frequencies(&self) -> Vec<u32> {
        let mut df = vec![0u32; self.n_terms];
        for row in &self.rows {
            for &(tid, _) in row {
                df[tid as usize] += 1;
            }
        }
        df
    }
}

/// Tokenize the corpus, freeze the vocabulary, then count terms per document.
pub fn build(
    documents: &[Document],
    stop_words: &StopWordSet,
    normalizer: &Normalizer,
) -> Result<(Vocabulary, CountMatrix)> {
    if documents.is_empty() {
        return Err(RankError::EmptyCorpus);
    }

    let tokenized: Vec<Vec<String>> = map_rows(documents, |doc| {
        normalizer
            .normalize(&doc.text())
            .into_iter()
            .filter(|t| !stop_words.contains(t))
            .collect()
    });

    let terms: BTreeSet<&str> = tokenized.iter().flatten().map(String::as_str).collect();
    if terms.is_empty() {
        return Err(RankError::EmptyCorpus);
    }
    let vocabulary = Vocabulary::from_sorted(terms.into_iter().map(str::to_owned).collect());
    tracing::debug!(terms = vocabulary.len(), "vocabulary frozen");

    let rows = map_rows(&tokenized, |tokens| count_row(&vocabulary, tokens));
    let counts = CountMatrix { rows, n_terms: vocabulary.len() };
    Ok((vocabulary, counts))
}

fn count_row(vocabulary: &Vocabulary, tokens: &[String]) -> Vec<(TermId, u32)> {
    let mut counts: HashMap<TermId, u32> = HashMap::new();
    for token in tokens {
        if let Some(tid) = vocabulary.lookup(token) {
            *counts.entry(tid).or_insert(0) += 1;
        }
    }
    let mut row: Vec<(TermId, u32)> = counts.into_iter().collect();
    row.sort_unstable_by_key(|&(tid, _)| tid);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new(0, "Le chat noir", "", "Le chat mange."),
            Document::new(1, "La politique", "", "Le gouvernement decide."),
        ]
    }

    #[test]
    fn stop_words_never_enter_the_vocabulary() {
        let stop: StopWordSet = ["le", "la"].into_iter().collect();
        let (vocab, _) = build(&docs(), &stop, &Normalizer::default()).unwrap();
        assert!(vocab.lookup("le").is_none());
        assert!(vocab.lookup("la").is_none());
        assert!(vocab.lookup("chat").is_some());
        assert!(vocab.lookup("mange.").is_some());
    }

    #[test]
    fn counts_repeated_terms() {
        let stop: StopWordSet = ["le", "la"].into_iter().collect();
        let (vocab, counts) = build(&docs(), &stop, &Normalizer::default()).unwrap();
        let chat = vocab.lookup("chat").unwrap();
        assert!(counts.rows()[0].contains(&(chat, 2)));
        assert!(counts.rows()[1].iter().all(|&(t, _)| t != chat));
        assert_eq!(counts.n_docs(), 2);
        assert_eq!(counts.n_terms(), vocab.len());
    }

    #[test]
    fn terms_are_numbered_in_sorted_order() {
        let (vocab, _) = build(&docs(), &StopWordSet::empty(), &Normalizer::default()).unwrap();
        let terms: Vec<&str> = vocab.iter().map(|(_, t)| t).collect();
        let mut sorted = terms.clone();
        sorted.sort_unstable();
        assert_eq!(terms, sorted);
        for (id, term) in vocab.iter() {
            assert_eq!(vocab.lookup(term), Some(id));
            assert_eq!(vocab.term(id), Some(term));
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = build(&[], &StopWordSet::empty(), &Normalizer::default()).unwrap_err();
        assert!(matches!(err, RankError::EmptyCorpus));
    }

    #[test]
    fn corpus_of_only_stop_words_is_rejected() {
        let stop: StopWordSet = ["le", "la"].into_iter().collect();
        let docs = vec![Document::new(0, "Le", "la", ""), Document::new(1, "", "", "")];
        let err = build(&docs, &stop, &Normalizer::default()).unwrap_err();
        assert!(matches!(err, RankError::EmptyCorpus));
    }

    #[test]
    fn document_frequencies_count_documents_not_occurrences() {
        let docs = vec![Document::new(0, "a a a", "", ""), Document::new(1, "a b", "", "")];
        let (vocab, counts) = build(&docs, &StopWordSet::empty(), &Normalizer::default()).unwrap();
        let df = counts.doc_frequencies();
        assert_eq!(df[vocab.lookup("a").unwrap() as usize], 2);
        assert_eq!(df[vocab.lookup("b").unwrap() as usize], 1);
    }
}

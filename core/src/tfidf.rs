//! TF-IDF weighting of a raw count matrix.
//!
//! With the default options a weight is `count * idf` where
//! `idf = ln((1 + N) / (1 + df)) + 1`, and every document row is then scaled to
//! unit Euclidean length. Rows without any term stay all-zero.

use crate::parallel::map_rows;
use crate::vocab::CountMatrix;
use crate::{DocId, Posting, TermId};
use serde::{Deserialize, Serialize};

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfIdfOptions {
    pub norm: Norm,
    /// Add one to N and to every df, as if an extra document held every term once.
    pub smooth_idf: bool,
    /// Use `1 + ln(count)` instead of the raw count.
    pub sublinear_tf: bool,
}

impl Default for TfIdfOptions {
    fn default() -> Self {
        Self { norm: Norm::L2, smooth_idf: true, sublinear_tf: false }
    }
}

/// Document x term weights, kept both row-wise and column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    rows: Vec<Vec<(TermId, f32)>>,
    /// Postings per term, sorted by doc_id.
    columns: Vec<Vec<Posting>>,
    idf: Vec<f32>,
}

impl WeightMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, doc_id: DocId) -> &[(TermId, f32)] {
        self.rows.get(doc_id as usize).map_or(&[], Vec::as_slice)
    }

    pub fn column(&self, term_id: TermId) -> &[Posting] {
        self.columns.get(term_id as usize).map_or(&[], Vec::as_slice)
    }

    pub fn idf(&self, term_id: TermId) -> Option<f32> {
        self.idf.get(term_id as usize).copied()
    }
}

pub fn idf(n_docs: usize, df: u32, smooth: bool) -> f32 {
    let (n, df) = if smooth {
        (n_docs as f64 + 1.0, df as f64 + 1.0)
    } else {
        (n_docs as f64, df as f64)
    };
    ((n / df).ln() + 1.0) as f32
}

pub fn transform(counts: &CountMatrix, options: &TfIdfOptions) -> WeightMatrix {
    let n_docs = counts.n_docs();
    let idf: Vec<f32> = counts
        .doc_frequencies()
        .into_iter()
        .map(|df| idf(n_docs, df, options.smooth_idf))
        .collect();

    let rows = map_rows(counts.rows(), |row| weigh_row(row, &idf, options));

    let mut columns: Vec<Vec<Posting>> = vec![Vec::new(); counts.n_terms()];
    for (doc_id, row) in rows.iter().enumerate() {
        for &(tid, weight) in row {
            columns[tid as usize].push(Posting { doc_id: doc_id as DocId, weight });
        }
    }

    WeightMatrix { rows, columns, idf }
}

fn weigh_row(row: &[(TermId, u32)], idf: &[f32], options: &TfIdfOptions) -> Vec<(TermId, f32)> {
    let mut weights: Vec<(TermId, f32)> = row
        .iter()
        .map(|&(tid, count)| {
            let tf = if options.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
            (tid, tf * idf[tid as usize])
        })
        .collect();

    let norm = match options.norm {
        Norm::L2 => weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt(),
        Norm::L1 => weights.iter().map(|(_, w)| w.abs()).sum::<f32>(),
        Norm::None => 1.0,
    };
    if norm > 0.0 {
        for (_, w) in weights.iter_mut() {
            *w /= norm;
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::normalize::Normalizer;
    use crate::stopwords::StopWordSet;
    use crate::vocab;

    fn matrix(texts: &[&str], options: &TfIdfOptions) -> (crate::vocab::Vocabulary, WeightMatrix) {
        let docs: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::new(i as DocId, *t, "", ""))
            .collect();
        let (vocab, counts) = vocab::build(&docs, &StopWordSet::empty(), &Normalizer::default()).unwrap();
        (vocab, transform(&counts, options))
    }

    #[test]
    fn smoothed_idf_matches_formula() {
        // N = 3, df = 1 -> ln(4 / 2) + 1
        assert!((idf(3, 1, true) - (2.0f32.ln() + 1.0)).abs() < 1e-6);
        // Term present everywhere still gets weight 1.
        assert!((idf(3, 3, true) - 1.0).abs() < 1e-6);
        assert!((idf(3, 3, false) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rows_have_unit_l2_norm() {
        let (_, m) = matrix(&["rust rust cargo", "cargo crate", "tokio"], &TfIdfOptions::default());
        for doc in 0..m.n_rows() {
            let norm: f32 = m.row(doc as DocId).iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "row {doc} has norm {norm}");
        }
    }

    #[test]
    fn empty_document_keeps_zero_row() {
        let (_, m) = matrix(&["rust", ""], &TfIdfOptions::default());
        assert!(m.row(1).is_empty());
        assert_eq!(m.n_rows(), 2);
    }

    #[test]
    fn rarer_term_weighs_more() {
        let (vocab, m) = matrix(&["common rare", "common"], &TfIdfOptions::default());
        let row = m.row(0);
        let weight = |t: &str| {
            let id = vocab.lookup(t).unwrap();
            row.iter().find(|(tid, _)| *tid == id).unwrap().1
        };
        assert!(weight("rare") > weight("common"));
    }

    #[test]
    fn columns_mirror_rows() {
        let (vocab, m) = matrix(&["a b", "b c", "c a b"], &TfIdfOptions::default());
        assert_eq!(m.n_cols(), vocab.len());
        for (tid, _) in vocab.iter() {
            let col = m.column(tid);
            assert!(col.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
            for p in col {
                let w = m.row(p.doc_id).iter().find(|(t, _)| *t == tid).unwrap().1;
                assert_eq!(w, p.weight);
            }
        }
    }

    #[test]
    fn l1_and_raw_options() {
        let opts = TfIdfOptions { norm: Norm::L1, ..TfIdfOptions::default() };
        let (_, m) = matrix(&["x y y", "y"], &opts);
        let sum: f32 = m.row(0).iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-5);

        let opts = TfIdfOptions { norm: Norm::None, smooth_idf: false, sublinear_tf: true };
        let (vocab, m) = matrix(&["y y", "z"], &opts);
        let y = vocab.lookup("y").unwrap();
        // (1 + ln 2) * (ln(2/1) + 1)
        let expected = (1.0 + 2.0f32.ln()) * (2.0f32.ln() + 1.0);
        assert!((m.row(0)[0].1 - expected).abs() < 1e-5);
        assert_eq!(m.row(0)[0].0, y);
    }
}

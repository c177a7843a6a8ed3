use crate::error::{RankError, Result};
use crate::normalize::fold;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref FRENCH: StopWordSet = StopWordSet::parse(include_str!("../data/fr_stop_words.txt"));
}

/// Where the stop-word list of an index comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWordSource {
    /// No filtering.
    #[default]
    None,
    Inline(String),
    File(PathBuf),
    /// The French list bundled with this crate.
    BuiltinFrench,
}

/// Canonicalized stop words, folded the same way as document tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWordSet {
    words: HashSet<String>,
}

impl StopWordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a line-oriented list. Blank lines and lines starting with `#` are skipped.
    pub fn parse(blob: &str) -> Self {
        let words = blob
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(fold)
            .collect();
        Self { words }
    }

    pub fn load(source: &StopWordSource) -> Result<Self> {
        match source {
            StopWordSource::None => Ok(Self::empty()),
            StopWordSource::Inline(text) => Ok(Self::parse(text)),
            StopWordSource::File(path) => Self::from_file(path),
            StopWordSource::BuiltinFrench => Ok(Self::french()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RankError::StopWordSource {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::parse(&text);
        tracing::debug!(path = %path.display(), words = set.len(), "loaded stop words");
        Ok(set)
    }

    pub fn french() -> Self {
        FRENCH.clone()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopWordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(|w| fold(w.as_ref())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let set = StopWordSet::parse("# header\nle\n\nla\n#la\nle\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("le"));
        assert!(set.contains("la"));
        assert!(!set.contains("#la"));
    }

    #[test]
    fn folds_accents_and_case() {
        let set = StopWordSet::parse("Été\r\nÀ\n");
        assert!(set.contains("ete"));
        assert!(set.contains("a"));
    }

    #[test]
    fn empty_source_means_no_filtering() {
        assert!(StopWordSet::parse("").is_empty());
        assert!(StopWordSet::load(&StopWordSource::None).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = StopWordSet::load(&StopWordSource::File("/nonexistent/fr.txt".into())).unwrap_err();
        assert!(matches!(err, RankError::StopWordSource { .. }));
    }

    #[test]
    fn bundled_french_list_is_folded() {
        let fr = StopWordSet::french();
        assert!(fr.contains("le"));
        assert!(fr.contains("etre"));
        assert!(fr.contains("ou"));
        assert!(!fr.contains("#"));
    }
}

use crate::normalize::TokenPattern;
use crate::search::SearchOptions;
use crate::stopwords::StopWordSource;
use crate::tfidf::TfIdfOptions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCORE_FLOOR: f32 = 0.01;
pub const DEFAULT_LIMIT: usize = 5;

/// Everything needed to build an index and to query it with sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub stop_word_source: StopWordSource,
    pub token_pattern: TokenPattern,
    pub tfidf: TfIdfOptions,
    pub score_floor: f32,
    pub default_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            stop_word_source: StopWordSource::None,
            token_pattern: TokenPattern::Whitespace,
            tfidf: TfIdfOptions::default(),
            score_floor: DEFAULT_SCORE_FLOOR,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl IndexConfig {
    pub fn with_stop_words(mut self, source: StopWordSource) -> Self {
        self.stop_word_source = source;
        self
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            limit: self.default_limit,
            score_floor: self.score_floor,
            require_all_terms: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: IndexConfig = serde_json::from_str(r#"{"score_floor": 0.5}"#).unwrap();
        assert_eq!(cfg.score_floor, 0.5);
        assert_eq!(cfg.default_limit, DEFAULT_LIMIT);
        assert_eq!(cfg.stop_word_source, StopWordSource::None);
    }

    #[test]
    fn search_options_follow_config() {
        let cfg = IndexConfig { default_limit: 3, score_floor: 0.2, ..IndexConfig::default() };
        let opts = cfg.search_options();
        assert_eq!(opts.limit, 3);
        assert_eq!(opts.score_floor, 0.2);
        assert!(!opts.require_all_terms);
    }
}

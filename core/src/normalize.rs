use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\b\w\w+\b").expect("valid regex");
}

/// How folded text is cut into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPattern {
    /// Split on whitespace only; punctuation stays attached to the token.
    #[default]
    Whitespace,
    /// Runs of two or more word characters.
    Word,
}

/// Canonicalizes raw text into tokens. The same instance must serve both
/// the corpus and incoming queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    pub pattern: TokenPattern,
}

impl Normalizer {
    pub fn new(pattern: TokenPattern) -> Self {
        Self { pattern }
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded = fold(text);
        match self.pattern {
            TokenPattern::Whitespace => folded.split_whitespace().map(str::to_owned).collect(),
            TokenPattern::Word => WORD_RE
                .find_iter(&folded)
                .map(|m| m.as_str().to_owned())
                .collect(),
        }
    }
}

/// Strip diacritics (NFKD, then drop combining marks) and lower-case.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Whitespace normalization, the default pipeline.
pub fn normalize(text: &str) -> Vec<String> {
    Normalizer::default().normalize(text)
}

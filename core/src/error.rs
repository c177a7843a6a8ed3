use std::io;
use std::path::PathBuf;

/// Errors surfaced by index construction and querying.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// No documents were supplied, or none of them produced an indexable token.
    #[error("no data to index: the corpus is empty or every document was filtered out")]
    EmptyCorpus,
    /// The stop-word list could not be read.
    #[error("cannot read stop words from {}: {source}", .path.display())]
    StopWordSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A query was issued before any index was successfully built.
    #[error("ranking model not built, can't search")]
    ModelNotBuilt,
    #[error("result limit must be at least 1")]
    InvalidLimit,
}

pub type Result<T> = std::result::Result<T, RankError>;

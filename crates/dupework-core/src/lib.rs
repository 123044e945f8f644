use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod author_id;
pub mod cache;
pub mod cluster;
pub mod config_file;
pub mod fetch;
pub mod mock;
pub mod normalize;
pub mod openlibrary;
pub mod session;
pub mod similarity;
pub mod traversal;

// Re-export for convenience
pub use author_id::{AuthorId, MAX_RANDOM_AUTHOR_NUMBER};
pub use cluster::{SIMILARITY_THRESHOLD, group_similar_works};
pub use fetch::{DEFAULT_RETRIES, FetchError, ResilientFetcher};
pub use openlibrary::{AuthorRecord, OpenLibrary, WorksPage};
pub use session::{Session, SessionConfig, SessionEvent, Visit, VisitError};
pub use traversal::{Direction, Navigation, TraversalController};

/// One catalog entry ("edition-independent book") attributed to an author.
///
/// Identity within a clustering pass is positional: two works with the same
/// text but different catalog keys are distinct entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl Work {
    /// The bare catalog id, e.g. `"OL123W"` from `"/works/OL123W"`.
    pub fn short_key(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// A cluster of works judged to represent the same underlying book.
///
/// `works` preserves input order with the anchor (cluster seed) last, and
/// always holds at least two members. `max_similarity` is the best score
/// between the anchor and any other member, strictly above the grouping
/// threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkGroup {
    pub max_similarity: f64,
    pub works: Vec<Work>,
}

/// Flags controlling how titles are normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Fold a work's subtitle into its comparison title.
    pub include_subtitles: bool,
    /// Strip punctuation (first occurrence) and stop-words before comparing.
    pub aggressive_normalization: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            include_subtitles: true,
            aggressive_normalization: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("author id {0:?} does not match the OL<number>A form")]
    InvalidAuthorId(String),
    #[error("malformed {context} record: {message}")]
    MalformedRecord { context: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_key_strips_works_prefix() {
        let work = Work {
            key: "/works/OL45804W".into(),
            title: "Fantastic Mr Fox".into(),
            subtitle: None,
        };
        assert_eq!(work.short_key(), "OL45804W");
    }

    #[test]
    fn short_key_passes_through_bare_ids() {
        let work = Work {
            key: "OL45804W".into(),
            title: String::new(),
            subtitle: None,
        };
        assert_eq!(work.short_key(), "OL45804W");
    }

    #[test]
    fn work_deserializes_with_missing_fields() {
        let work: Work = serde_json::from_str(r#"{"key": "/works/OL1W"}"#).unwrap();
        assert_eq!(work.key, "/works/OL1W");
        assert_eq!(work.title, "");
        assert!(work.subtitle.is_none());
    }
}

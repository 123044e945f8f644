//! Pairwise string similarity scoring.
//!
//! Thin wrapper over `rapidfuzz`'s normalized InDel ratio: symmetric,
//! `score(x, x) == 1.0`, and monotonically sensitive to character edits.

/// Similarity of two strings in `[0, 1]`.
pub fn score(a: &str, b: &str) -> f64 {
    rapidfuzz::fuzz::ratio(a.chars(), b.chars())
}

/// Scores of one query against a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchScores {
    /// One score per candidate, in candidate order.
    pub scores: Vec<f64>,
    /// Index of the best-scoring candidate; `None` when there are none.
    pub best_index: Option<usize>,
    /// The best score seen, `0.0` when there are no candidates.
    pub best_score: f64,
}

/// Score `query` against every candidate. Ties keep the earliest candidate.
pub fn find_best_match<S: AsRef<str>>(query: &str, candidates: &[S]) -> BatchScores {
    let mut scores = Vec::with_capacity(candidates.len());
    let mut best_index = None;
    let mut best_score = 0.0f64;

    for (index, candidate) in candidates.iter().enumerate() {
        let rating = score(query, candidate.as_ref());
        if best_index.is_none() || rating > best_score {
            best_index = Some(index);
            best_score = rating;
        }
        scores.push(rating);
    }

    BatchScores {
        scores,
        best_index,
        best_score,
    }
}

//! Greedy clustering of an author's works into duplicate groups.

use std::collections::VecDeque;

use crate::normalize::comparison_title;
use crate::similarity::find_best_match;
use crate::{MatchConfig, Work, WorkGroup};

/// Two titles are considered the same book when their similarity strictly
/// exceeds this.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

/// Partition `works` into disjoint duplicate groups.
///
/// Greedy and order-sensitive: the first remaining work becomes the anchor
/// of a round, every remaining work scoring strictly above
/// [`SIMILARITY_THRESHOLD`] against it joins the group, and the anchor is
/// consumed whether or not a group formed. Each group lists its members in
/// input order with the anchor last.
///
/// A full recompute over its own snapshot of the input: no state is carried
/// between calls, and identical input + config always produces identical
/// groups. Fewer than two works yields no groups.
pub fn group_similar_works(works: &[Work], config: MatchConfig) -> Vec<WorkGroup> {
    let mut groups = Vec::new();
    let mut remaining: VecDeque<Work> = works.to_vec().into();

    while remaining.len() > 1 {
        let Some(anchor) = remaining.pop_front() else {
            break;
        };
        let anchor_title = comparison_title(&anchor, config);
        let candidate_titles: Vec<String> = remaining
            .iter()
            .map(|work| comparison_title(work, config))
            .collect();

        let batch = find_best_match(&anchor_title, &candidate_titles);
        if batch.best_score > SIMILARITY_THRESHOLD {
            let mut members = Vec::new();
            let mut kept = VecDeque::with_capacity(remaining.len());
            for (index, work) in remaining.drain(..).enumerate() {
                if batch.scores[index] > SIMILARITY_THRESHOLD {
                    members.push(work);
                } else {
                    kept.push_back(work);
                }
            }
            remaining = kept;
            members.push(anchor);
            groups.push(WorkGroup {
                max_similarity: batch.best_score,
                works: members,
            });
        }
    }

    groups
}

//! Title normalization for duplicate comparison.
//!
//! Produces the canonical comparison string for a work: subtitle folded in
//! when configured, an optional aggressive pass that strips punctuation and
//! stop-words, and a final lowercase so comparison is case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{MatchConfig, Work};

/// Words removed from titles during aggressive normalization.
const STOP_WORDS: [&str; 3] = ["the", "and", "at"];

static NON_ALNUM_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ]").unwrap());

/// Build the comparison string for a work under the given configuration.
///
/// Pure and deterministic: same work + same config → same output.
pub fn comparison_title(work: &Work, config: MatchConfig) -> String {
    let mut title = work.title.clone();
    if config.include_subtitles
        && let Some(subtitle) = &work.subtitle
    {
        title.push(' ');
        title.push_str(subtitle);
    }
    if config.aggressive_normalization {
        normalize_aggressive(&title)
    } else {
        title.to_lowercase()
    }
}

/// Aggressive pass: strip punctuation, lowercase, drop stop-words.
///
/// Strips only the first non-alphanumeric character.
/// TODO: strip all punctuation; widening this changes which titles group
/// together and needs sign-off first.
fn normalize_aggressive(title: &str) -> String {
    let stripped = NON_ALNUM_SPACE.replace(title, "");
    strip_stop_words(&stripped.to_lowercase())
}

/// Remove each stop-word where it appears as a whole space-delimited token.
/// The string is padded so leading and trailing tokens are covered too.
fn strip_stop_words(title: &str) -> String {
    let mut padded = format!(" {title} ");
    for word in STOP_WORDS {
        padded = padded.replace(&format!(" {word} "), " ");
    }
    padded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(title: &str, subtitle: Option<&str>) -> Work {
        Work {
            key: "/works/OL1W".into(),
            title: title.into(),
            subtitle: subtitle.map(Into::into),
        }
    }

    fn aggressive() -> MatchConfig {
        MatchConfig {
            include_subtitles: true,
            aggressive_normalization: true,
        }
    }

    fn plain() -> MatchConfig {
        MatchConfig {
            include_subtitles: false,
            aggressive_normalization: false,
        }
    }

    #[test]
    fn lowercases_without_aggressive_pass() {
        let w = work("The Great Gatsby", None);
        assert_eq!(comparison_title(&w, plain()), "the great gatsby");
    }

    #[test]
    fn plain_mode_keeps_punctuation() {
        let w = work("Who's Afraid?", None);
        assert_eq!(comparison_title(&w, plain()), "who's afraid?");
    }

    #[test]
    fn subtitle_folded_in_when_enabled() {
        let w = work("Dune", Some("Messiah"));
        assert_eq!(comparison_title(&w, aggressive()), "dune messiah");
        let without = MatchConfig {
            include_subtitles: false,
            aggressive_normalization: true,
        };
        assert_eq!(comparison_title(&w, without), "dune");
    }

    #[test]
    fn missing_subtitle_is_fine() {
        let w = work("Dune", None);
        assert_eq!(comparison_title(&w, aggressive()), "dune");
    }

    #[test]
    fn strips_only_the_first_punctuation_character() {
        let w = work("Hello, World!", None);
        // The comma goes, the exclamation mark stays.
        assert_eq!(comparison_title(&w, aggressive()), "hello world!");
    }

    #[test]
    fn stop_words_removed_as_whole_tokens() {
        let w = work("Murder at the Vicarage", None);
        assert_eq!(comparison_title(&w, aggressive()), "murder vicarage");
    }

    #[test]
    fn leading_stop_word_removed() {
        let w = work("The Great Gatsby", None);
        assert_eq!(comparison_title(&w, aggressive()), "great gatsby");
    }

    #[test]
    fn stop_word_prefixes_of_words_survive() {
        // "and" inside "Andes", "at" inside "Attic": token match only.
        let w = work("Andes Attic", None);
        assert_eq!(comparison_title(&w, aggressive()), "andes attic");
    }

    #[test]
    fn idempotent_on_normalized_output() {
        for title in [
            "The Great Gatsby",
            "Murder at the Vicarage",
            "Hello, World",
            "A Room of One's Own",
        ] {
            let once = comparison_title(&work(title, None), aggressive());
            let twice = comparison_title(&work(&once, None), aggressive());
            assert_eq!(once, twice, "not idempotent for {title:?}");
        }
    }

    #[test]
    fn empty_title_stays_empty() {
        let w = work("", None);
        assert_eq!(comparison_title(&w, aggressive()), "");
    }
}

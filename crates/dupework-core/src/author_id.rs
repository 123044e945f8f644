//! Typed Open Library author identifiers (`OL<number>A`).

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::CoreError;

/// Approximate top of the known author id space. Expected to need periodic
/// upward revision as the catalog grows.
pub const MAX_RANDOM_AUTHOR_NUMBER: u64 = 9_500_000;

static AUTHOR_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^OL(\d+)A$").unwrap());

/// An author id of the form `OL<number>A`, where the number is the only part
/// ever manipulated. The numeric component is always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorId(u64);

impl AuthorId {
    /// Build an id from its numeric component. Zero is rejected: the id
    /// space starts at `OL1A`.
    pub fn new(number: u64) -> Result<Self, CoreError> {
        if number == 0 {
            return Err(CoreError::InvalidAuthorId("OL0A".into()));
        }
        Ok(Self(number))
    }

    /// Parse an id string, e.g. `"OL1394244A"`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        let captures = AUTHOR_ID_RE
            .captures(trimmed)
            .ok_or_else(|| CoreError::InvalidAuthorId(trimmed.to_string()))?;
        let number: u64 = captures[1]
            .parse()
            .map_err(|_| CoreError::InvalidAuthorId(trimmed.to_string()))?;
        Self::new(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    /// The id one step forward.
    pub fn next(&self) -> AuthorId {
        AuthorId(self.0.saturating_add(1))
    }

    /// The id one step backward, saturating at `OL1A`.
    pub fn previous(&self) -> AuthorId {
        AuthorId(self.0.max(2) - 1)
    }

    /// A uniformly random id in `[1, MAX_RANDOM_AUTHOR_NUMBER]`.
    pub fn random() -> AuthorId {
        AuthorId(fastrand::u64(1..=MAX_RANDOM_AUTHOR_NUMBER))
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OL{}A", self.0)
    }
}

impl FromStr for AuthorId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AuthorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        let id = AuthorId::parse("OL1394244A").unwrap();
        assert_eq!(id.number(), 1394244);
        assert_eq!(id.to_string(), "OL1394244A");
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(AuthorId::parse("  OL5A ").unwrap().number(), 5);
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for bad in ["", "OL", "123", "ol123a", "OL12B", "OLxA", "OL12A extra"] {
            assert!(AuthorId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_rejects_zero() {
        assert!(AuthorId::parse("OL0A").is_err());
    }

    #[test]
    fn next_and_previous_step_by_one() {
        let id = AuthorId::parse("OL100A").unwrap();
        assert_eq!(id.next().to_string(), "OL101A");
        assert_eq!(id.previous().to_string(), "OL99A");
    }

    #[test]
    fn previous_saturates_at_one() {
        let id = AuthorId::parse("OL1A").unwrap();
        assert_eq!(id.previous().to_string(), "OL1A");
    }

    #[test]
    fn random_stays_in_range() {
        for _ in 0..200 {
            let n = AuthorId::random().number();
            assert!((1..=MAX_RANDOM_AUTHOR_NUMBER).contains(&n));
        }
    }

    #[test]
    fn serializes_as_display_string() {
        let id = AuthorId::parse("OL42A").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"OL42A\"");
    }
}

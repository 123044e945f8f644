//! Traversal state machine over author ids.
//!
//! Tracks the current id, the autopilot direction, and the
//! search-until-similarity toggle. Manual actions set the direction;
//! [`advance_after`](TraversalController::advance_after) re-fires the same
//! action while the toggle is on and a visit came back without duplicate
//! groups. Deciding *when* to evaluate a visit is the session's job; this
//! type only answers "which id next".

use crate::author_id::AuthorId;

/// Autopilot direction chosen by the latest manual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
    Random,
}

/// What a direct id submission means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Move to a different id and evaluate it.
    Visit(AuthorId),
    /// The submitted id is the current one: re-evaluate it, bypassing the
    /// works cache.
    Refresh(AuthorId),
}

#[derive(Debug, Clone)]
pub struct TraversalController {
    current: AuthorId,
    direction: Option<Direction>,
    enabled: bool,
}

impl TraversalController {
    pub fn new(start: AuthorId, enabled: bool) -> Self {
        Self {
            current: start,
            direction: None,
            enabled,
        }
    }

    pub fn current(&self) -> AuthorId {
        self.current
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle search-until-similarity.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Manual "next id": sets the direction and advances.
    pub fn go_next(&mut self) -> AuthorId {
        self.direction = Some(Direction::Next);
        self.current = self.current.next();
        self.current
    }

    /// Manual "previous id": sets the direction and retreats.
    pub fn go_previous(&mut self) -> AuthorId {
        self.direction = Some(Direction::Previous);
        self.current = self.current.previous();
        self.current
    }

    /// Manual "random id": sets the direction and jumps.
    pub fn go_random(&mut self) -> AuthorId {
        self.direction = Some(Direction::Random);
        self.current = AuthorId::random();
        self.current
    }

    /// Manual direct id entry. Clears the direction; submitting the current
    /// id is a refresh, not a navigation.
    pub fn go_to(&mut self, id: AuthorId) -> Navigation {
        self.direction = None;
        if id == self.current {
            Navigation::Refresh(id)
        } else {
            self.current = id;
            Navigation::Visit(id)
        }
    }

    /// Automatic follow-up after a completed visit that found `groups_found`
    /// duplicate groups. Re-fires the current direction when the toggle is
    /// on and nothing was found; otherwise the traversal halts here.
    ///
    /// Only for *completed* visits: a failed visit must halt the walk, so
    /// callers never get here with an error in hand.
    pub fn advance_after(&mut self, groups_found: usize) -> Option<(Direction, AuthorId)> {
        if !self.enabled || groups_found > 0 {
            return None;
        }
        let direction = self.direction?;
        let id = match direction {
            Direction::Next => self.go_next(),
            Direction::Previous => self.go_previous(),
            Direction::Random => self.go_random(),
        };
        Some((direction, id))
    }
}

//! Drives author visits: fetch the author record and works list, recompute
//! duplicate groups, and apply autopilot continuation.
//!
//! One visit is in flight at a time. Each navigation supersedes whatever
//! automatic continuation was running before it; results belonging to a
//! superseded visit are discarded, never applied. The
//! `(id, author, works, groups)` snapshot is replaced as a single unit, so
//! a failed or abandoned visit leaves the previous author's state intact.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::author_id::AuthorId;
use crate::cluster::group_similar_works;
use crate::openlibrary::{AuthorRecord, OpenLibrary};
use crate::traversal::{Direction, Navigation, TraversalController};
use crate::{CoreError, MatchConfig, Work, WorkGroup};

/// A visit that failed, tagged with the author id being visited.
#[derive(Error, Debug)]
#[error("visit to {id} failed: {source}")]
pub struct VisitError {
    pub id: AuthorId,
    #[source]
    pub source: CoreError,
}

/// The fully evaluated state of one author visit.
#[derive(Debug, Clone)]
pub struct Visit {
    pub id: AuthorId,
    pub author: AuthorRecord,
    pub works: Vec<Work>,
    pub groups: Vec<WorkGroup>,
}

/// Progress notifications emitted while a navigation runs.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Visiting {
        id: AuthorId,
        automatic: bool,
    },
    Visited {
        id: AuthorId,
        works: usize,
        groups: usize,
    },
    Advancing {
        from: AuthorId,
        to: AuthorId,
        direction: Direction,
    },
    /// The visit's results were discarded because a newer navigation
    /// superseded it.
    Superseded {
        id: AuthorId,
    },
    /// The automatic-visit bound was hit before anything was found.
    AutoLimitReached {
        visits: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub match_config: MatchConfig,
    /// Autopilot toggle: keep walking until a visit yields duplicate groups.
    pub search_until_similarity: bool,
    /// Retry budget handed to the fetch layer.
    pub retries: u32,
    /// Upper bound on automatic visits per manual action.
    pub max_auto_visits: usize,
    /// Pause between automatic visits, to stay polite to the upstream.
    pub visit_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            search_until_similarity: true,
            retries: crate::fetch::DEFAULT_RETRIES,
            max_auto_visits: 500,
            visit_delay: Duration::from_millis(250),
        }
    }
}

type EventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

enum Evaluation {
    Completed { works: usize, groups: usize },
    Superseded,
}

pub struct Session {
    client: OpenLibrary,
    controller: TraversalController,
    match_config: MatchConfig,
    max_auto_visits: usize,
    visit_delay: Duration,
    current: Option<Visit>,
    /// Cancelling this aborts every navigation the session will ever run.
    shutdown: CancellationToken,
    /// Token of the navigation currently in flight; replaced (and the old
    /// one cancelled) whenever a new navigation begins.
    navigation: CancellationToken,
    events: EventSink,
}

impl Session {
    pub fn new(client: OpenLibrary, start: AuthorId, config: SessionConfig) -> Self {
        let shutdown = CancellationToken::new();
        let navigation = shutdown.child_token();
        Self {
            client,
            controller: TraversalController::new(start, config.search_until_similarity),
            match_config: config.match_config,
            max_auto_visits: config.max_auto_visits,
            visit_delay: config.visit_delay,
            current: None,
            shutdown,
            navigation,
            events: Arc::new(|_| {}),
        }
    }

    /// Install a progress-event callback.
    pub fn with_events(mut self, sink: impl Fn(SessionEvent) + Send + Sync + 'static) -> Self {
        self.events = Arc::new(sink);
        self
    }

    /// Token that cancels the whole session (e.g. wired to Ctrl-C).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn current(&self) -> Option<&Visit> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> AuthorId {
        self.controller.current()
    }

    pub fn controller(&self) -> &TraversalController {
        &self.controller
    }

    pub fn set_search_until_similarity(&mut self, enabled: bool) {
        self.controller.set_enabled(enabled);
    }

    /// Manual "next id" action.
    pub async fn go_next(&mut self) -> Result<Option<Visit>, VisitError> {
        let cancel = self.begin_navigation();
        let id = self.controller.go_next();
        self.run_visits(id, false, cancel).await
    }

    /// Manual "previous id" action.
    pub async fn go_previous(&mut self) -> Result<Option<Visit>, VisitError> {
        let cancel = self.begin_navigation();
        let id = self.controller.go_previous();
        self.run_visits(id, false, cancel).await
    }

    /// Manual "random id" action.
    pub async fn go_random(&mut self) -> Result<Option<Visit>, VisitError> {
        let cancel = self.begin_navigation();
        let id = self.controller.go_random();
        self.run_visits(id, false, cancel).await
    }

    /// Manual direct id entry. Entering the current id refreshes it with
    /// the works cache bypassed instead of navigating.
    pub async fn go_to(&mut self, id: AuthorId) -> Result<Option<Visit>, VisitError> {
        let cancel = self.begin_navigation();
        match self.controller.go_to(id) {
            Navigation::Refresh(id) => self.run_visits(id, true, cancel).await,
            Navigation::Visit(id) => self.run_visits(id, false, cancel).await,
        }
    }

    /// Re-evaluate the current id, bypassing the works cache.
    pub async fn refresh(&mut self) -> Result<Option<Visit>, VisitError> {
        let id = self.controller.current();
        self.go_to(id).await
    }

    /// Supersede any in-flight navigation and mint a token for the new one.
    fn begin_navigation(&mut self) -> CancellationToken {
        self.navigation.cancel();
        self.navigation = self.shutdown.child_token();
        self.navigation.clone()
    }

    /// Visit `first`, then follow the controller's automatic continuation
    /// until something is found, the walk halts, or the navigation is
    /// superseded (`Ok(None)`).
    async fn run_visits(
        &mut self,
        first: AuthorId,
        refresh_works: bool,
        cancel: CancellationToken,
    ) -> Result<Option<Visit>, VisitError> {
        let mut id = first;
        let mut refresh_works = refresh_works;
        let mut automatic_visits = 0usize;

        loop {
            self.emit(SessionEvent::Visiting {
                id,
                automatic: automatic_visits > 0,
            });

            let evaluation = self
                .evaluate(id, refresh_works, &cancel)
                .await
                .map_err(|source| VisitError { id, source })?;

            let groups = match evaluation {
                Evaluation::Superseded => {
                    self.emit(SessionEvent::Superseded { id });
                    return Ok(None);
                }
                Evaluation::Completed { works, groups } => {
                    self.emit(SessionEvent::Visited { id, works, groups });
                    groups
                }
            };

            // Stop before the controller moves again once the bound is hit.
            let would_advance = self.controller.is_enabled()
                && groups == 0
                && self.controller.direction().is_some();
            if would_advance && automatic_visits >= self.max_auto_visits {
                self.emit(SessionEvent::AutoLimitReached {
                    visits: automatic_visits,
                });
                return Ok(self.current.clone());
            }

            let Some((direction, next)) = self.controller.advance_after(groups) else {
                return Ok(self.current.clone());
            };

            automatic_visits += 1;
            self.emit(SessionEvent::Advancing {
                from: id,
                to: next,
                direction,
            });

            if !self.visit_delay.is_zero() {
                tokio::time::sleep(self.visit_delay).await;
            }
            if cancel.is_cancelled() {
                self.emit(SessionEvent::Superseded { id: next });
                return Ok(None);
            }

            id = next;
            refresh_works = false;
        }
    }

    /// Evaluate one visit. The author and works fetches are both initiated
    /// as soon as the id is set; clustering runs once the works resolve, and
    /// the current snapshot is replaced as one unit. A navigation superseded
    /// mid-flight applies nothing.
    async fn evaluate(
        &mut self,
        id: AuthorId,
        refresh_works: bool,
        cancel: &CancellationToken,
    ) -> Result<Evaluation, CoreError> {
        let client = &self.client;
        let (author, works_page) =
            tokio::join!(client.author(id), client.works(id, !refresh_works));

        if cancel.is_cancelled() {
            return Ok(Evaluation::Superseded);
        }

        let author = author?;
        let works = works_page?.entries;
        let groups = group_similar_works(&works, self.match_config);
        tracing::debug!(
            %id,
            works = works.len(),
            groups = groups.len(),
            "visit evaluated"
        );

        let summary = Evaluation::Completed {
            works: works.len(),
            groups: groups.len(),
        };
        self.current = Some(Visit {
            id,
            author,
            works,
            groups,
        });
        Ok(summary)
    }

    fn emit(&self, event: SessionEvent) {
        (self.events)(event);
    }
}

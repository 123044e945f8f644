//! Open Library author and works endpoints.

use serde::{Deserialize, Serialize};

use crate::author_id::AuthorId;
use crate::fetch::ResilientFetcher;
use crate::{CoreError, Work};

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Fixed page size for the works query.
pub const WORKS_PAGE_LIMIT: usize = 1000;

const REDIRECT_TYPE_KEY: &str = "/type/redirect";

/// An author's metadata record. Every field is optional: the upstream
/// records are sparse and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub remote_ids: RemoteIds,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteIds {
    #[serde(default)]
    pub wikidata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default)]
    pub key: String,
}

impl AuthorRecord {
    /// Whether this record redirects to another author.
    pub fn is_redirect(&self) -> bool {
        self.record_type
            .as_ref()
            .is_some_and(|t| t.key == REDIRECT_TYPE_KEY)
    }

    /// `"birth - death"` when either date is present.
    pub fn lived(&self) -> Option<String> {
        if self.birth_date.is_none() && self.death_date.is_none() {
            return None;
        }
        Some(format!(
            "{} - {}",
            self.birth_date.as_deref().unwrap_or(""),
            self.death_date.as_deref().unwrap_or(""),
        ))
    }
}

/// One page of an author's works. A missing `entries` field means no works.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorksPage {
    #[serde(default)]
    pub entries: Vec<Work>,
}

/// Client for the two author endpoints, generic over the fetch layer's
/// transport so tests can point it anywhere.
pub struct OpenLibrary {
    fetcher: ResilientFetcher,
    base_url: String,
    retries: u32,
}

impl OpenLibrary {
    pub fn new(fetcher: ResilientFetcher, base_url: impl Into<String>, retries: u32) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            fetcher,
            base_url,
            retries,
        }
    }

    pub fn author_url(&self, id: AuthorId) -> String {
        format!("{}/authors/{}.json", self.base_url, id)
    }

    pub fn works_url(&self, id: AuthorId) -> String {
        format!(
            "{}/authors/{}/works.json?limit={}",
            self.base_url, id, WORKS_PAGE_LIMIT
        )
    }

    /// Fetch an author's metadata record. Always willing to reuse a cached
    /// response; an explicit refresh re-reads the works list, not this.
    pub async fn author(&self, id: AuthorId) -> Result<AuthorRecord, CoreError> {
        let value = self
            .fetcher
            .fetch_json(&self.author_url(id), self.retries, true)
            .await?;
        serde_json::from_value((*value).clone()).map_err(|e| CoreError::MalformedRecord {
            context: "author",
            message: e.to_string(),
        })
    }

    /// Fetch an author's works page. `use_cache = false` forces a full
    /// network fetch (user-initiated refresh).
    pub async fn works(&self, id: AuthorId, use_cache: bool) -> Result<WorksPage, CoreError> {
        let value = self
            .fetcher
            .fetch_json(&self.works_url(id), self.retries, use_cache)
            .await?;
        serde_json::from_value((*value).clone()).map_err(|e| CoreError::MalformedRecord {
            context: "works",
            message: e.to_string(),
        })
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }
}

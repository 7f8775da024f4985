use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::core::cache::TtlCache;

const TOURNAMENT_QUERY: &str = r#"
query T($slug: String!) {
  tournament(slug: $slug) {
    id
    name
    startAt
    timezone
    events { id name slug startAt }
  }
}
"#;

/// One game bracket within a tournament.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TournamentEvent {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(rename = "startAt", default)]
    pub start_at: Option<i64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    /// Unix seconds.
    #[serde(rename = "startAt", default)]
    pub start_at: Option<i64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<TournamentEvent>>,
}

impl Tournament {
    pub fn events(&self) -> &[TournamentEvent] {
        self.events.as_deref().unwrap_or_default()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.name.clone())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// Read-only access to the tournament platform.
#[async_trait]
pub trait TournamentLookup: Send + Sync {
    /// `Ok(None)` when the platform does not know the slug.
    async fn fetch_tournament(&self, slug: &str) -> anyhow::Result<Option<Tournament>>;

    /// Events of a tournament, empty on any failure.
    async fn fetch_events(&self, slug: &str) -> Vec<TournamentEvent> {
        match self.fetch_tournament(slug).await {
            Ok(Some(tournament)) => tournament.events().to_vec(),
            Ok(None) => {
                log::warn!("Tournament '{}' not found", slug);
                vec![]
            }
            Err(e) => {
                log::warn!("Failed to fetch events for '{}': {}", slug, e);
                vec![]
            }
        }
    }
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<TournamentData>,
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct TournamentData {
    tournament: Option<Tournament>,
}

/// GraphQL client for start.gg.
pub struct StartGgClient {
    client: reqwest::Client,
    url: Url,
    api_key: Option<String>,
}

impl StartGgClient {
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(StartGgClient {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: Url::parse(url)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl TournamentLookup for StartGgClient {
    async fn fetch_tournament(&self, slug: &str) -> anyhow::Result<Option<Tournament>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(anyhow!("No start.gg API key configured"))?;

        log::debug!("Querying start.gg for tournament '{}'", slug);
        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(api_key)
            .json(&json!({ "query": TOURNAMENT_QUERY, "variables": { "slug": slug } }))
            .send()
            .await?
            .error_for_status()?;

        let payload: GraphQlResponse = response.json().await?;
        if let Some(errors) = payload.errors {
            bail!("start.gg returned errors: {}", errors);
        }

        Ok(payload.data.and_then(|d| d.tournament))
    }
}

/// A lookup whose answers are remembered for a fixed time.
pub struct CachedTournamentLookup {
    inner: Arc<dyn TournamentLookup>,
    cache: TtlCache<String, Tournament>,
}

impl CachedTournamentLookup {
    pub fn new(inner: Arc<dyn TournamentLookup>, cache: TtlCache<String, Tournament>) -> Self {
        CachedTournamentLookup { inner, cache }
    }

    pub fn invalidate(&self, slug: &str) -> bool {
        self.cache.invalidate(&slug.to_string())
    }
}

#[async_trait]
impl TournamentLookup for CachedTournamentLookup {
    async fn fetch_tournament(&self, slug: &str) -> anyhow::Result<Option<Tournament>> {
        if let Some(hit) = self.cache.get(&slug.to_string()) {
            log::debug!("Tournament cache hit for '{}'", slug);
            return Ok(Some(hit));
        }

        let fetched = self.inner.fetch_tournament(slug).await?;
        if let Some(tournament) = &fetched {
            self.cache.insert(slug.to_string(), tournament.clone());
        }
        Ok(fetched)
    }
}

static TOURNAMENT_SLUG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Pull the tournament slug out of a start.gg link.
pub fn extract_tournament_slug(link: &str) -> Option<String> {
    let link = link.trim();
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.to_string(),
    };

    let regex = TOURNAMENT_SLUG_REGEX.get_or_init(|| Regex::new(r"/tournament/([^/?#]+)").unwrap());
    regex
        .captures(&path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

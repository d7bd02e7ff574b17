//! Session-token client for the MovieMeter web service.
//!
//! The service allows a limited number of sessions per address and cuts
//! each session off after 50 requests, so the token is persisted to disk
//! and resumed across runs. The whole check-then-call-then-persist sequence
//! runs under one lock: re-authentication swaps the entire token, so
//! concurrent callers must never interleave with it.

use std::future::Future;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::error::ScrapeError;
use crate::types::{FilmDetail, FilmSummary, SessionHandshake};

/// Requests allowed per session before a new handshake is forced, kept
/// under the service's hard cutoff of 50.
pub const SESSION_CALL_BUDGET: u32 = 48;

/// A renewable session credential plus usage counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub key: String,
    /// Epoch seconds the session expires at.
    pub expires_at: u64,
    pub call_count: u32,
}

impl SessionToken {
    /// Parse the single-line `key,expiresAt,callCount` session file format.
    /// Anything malformed yields `None` (treated as "no prior session").
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let key = fields.next()?.to_string();
        let expires_at = fields.next()?.trim().parse().ok()?;
        let call_count = fields.next()?.trim().parse().ok()?;
        if key.is_empty() || fields.next().is_some() {
            return None;
        }
        Some(Self {
            key,
            expires_at,
            call_count,
        })
    }

    fn to_line(&self) -> String {
        format!("{},{},{}", self.key, self.expires_at, self.call_count)
    }

    /// A token is usable while the key is set, the expiry is in the future,
    /// and the per-session call budget is not exhausted. Pure check: never
    /// touches the counter.
    pub fn is_valid(&self, now: u64) -> bool {
        !self.key.is_empty() && now < self.expires_at && self.call_count < SESSION_CALL_BUDGET
    }
}

/// Remote operations the session client performs, split behind a trait so
/// the HTTP binding and test doubles plug in the same way.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    /// `api.startSession` handshake. `Ok(None)` when the service answered
    /// with an empty document.
    async fn start_session(&self, api_key: &str)
    -> Result<Option<SessionHandshake>, ScrapeError>;

    /// `film.search` by title.
    async fn search_films(
        &self,
        session_key: &str,
        title: &str,
    ) -> Result<Vec<FilmSummary>, ScrapeError>;

    /// `film.retrieveDetails` by film id.
    async fn film_details(
        &self,
        session_key: &str,
        film_id: &str,
    ) -> Result<FilmDetail, ScrapeError>;
}

/// Session-caching client: resumes a persisted session when possible and
/// re-authenticates transparently when the token goes stale. Remote
/// failures degrade to empty results; nothing propagates to callers.
pub struct SessionClient {
    api: Box<dyn SessionApi>,
    api_key: String,
    session_file: PathBuf,
    token: Mutex<Option<SessionToken>>,
}

impl SessionClient {
    /// Open a client, seeding the token from the session file when present
    /// and well-formed. A missing or malformed file means no prior session;
    /// staleness is checked before the first call, not here.
    pub fn open(
        api: Box<dyn SessionApi>,
        api_key: impl Into<String>,
        session_file: impl Into<PathBuf>,
    ) -> Self {
        let session_file = session_file.into();
        let token = std::fs::read_to_string(&session_file)
            .ok()
            .and_then(|contents| SessionToken::parse(&contents));
        match &token {
            Some(token) => log::debug!(
                "resumed stored session ({} calls used)",
                token.call_count
            ),
            None => log::debug!("no stored session"),
        }
        Self {
            api,
            api_key: api_key.into(),
            session_file,
            token: Mutex::new(token),
        }
    }

    /// True when a currently-valid session token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_valid(epoch_now()))
    }

    /// Calls charged against the current session, if one is held.
    pub async fn call_count(&self) -> Option<u32> {
        self.token.lock().await.as_ref().map(|t| t.call_count)
    }

    /// Search and return the first result.
    pub async fn get_by_title(&self, title: &str) -> Option<FilmSummary> {
        self.get_by_title_and_year(title, None).await
    }

    /// Search and prefer an exact year match, falling back to the first
    /// result when no year matches.
    pub async fn get_by_title_and_year(&self, title: &str, year: Option<&str>) -> Option<FilmSummary> {
        let films = self
            .with_session(|key| async move { self.api.search_films(&key, title).await })
            .await?;
        if films.is_empty() {
            return None;
        }
        log::debug!("search for '{}' returned {} results", title, films.len());

        if let Some(year) = year {
            if let Some(film) = films.iter().find(|f| f.year.as_deref() == Some(year)) {
                return Some(film.clone());
            }
        }
        films.into_iter().next()
    }

    /// Retrieve the full record for a film id.
    pub async fn get_details_by_id(&self, film_id: &str) -> Option<FilmDetail> {
        self.with_session(|key| async move { self.api.film_details(&key, film_id).await })
            .await
    }

    /// Run one authenticated call: revalidate (re-handshaking if needed),
    /// invoke, then charge the call and persist the token. The token lock
    /// is held across the whole sequence.
    async fn with_session<T, F, Fut>(&self, op: F) -> Option<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let mut token = self.token.lock().await;

        if !token.as_ref().is_some_and(|t| t.is_valid(epoch_now())) {
            if let Err(e) = self.start_session(&mut token).await {
                log::warn!("unable to establish a session: {}", e);
                return None;
            }
        }
        let key = token.as_ref().map(|t| t.key.clone())?;

        match op(key).await {
            Ok(value) => {
                if let Some(token) = token.as_mut() {
                    token.call_count += 1;
                    self.persist(token);
                }
                Some(value)
            }
            Err(e) => {
                log::error!("remote call failed: {}", e);
                None
            }
        }
    }

    async fn start_session(
        &self,
        slot: &mut Option<SessionToken>,
    ) -> Result<(), ScrapeError> {
        *slot = None;
        match self.api.start_session(&self.api_key).await? {
            Some(handshake) => {
                log::debug!("created new session");
                let token = SessionToken {
                    key: handshake.session_key,
                    expires_at: handshake.valid_till,
                    call_count: 0,
                };
                self.persist(&token);
                *slot = Some(token);
                Ok(())
            }
            None => Err(ScrapeError::Session(
                "start session returned an empty response".to_string(),
            )),
        }
    }

    /// Overwrite the session file with the current token. Persistence
    /// failures are logged, never fatal.
    fn persist(&self, token: &SessionToken) {
        if let Some(parent) = self.session_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let line = format!("{}\n", token.to_line());
        if let Err(e) = std::fs::write(&self.session_file, line) {
            log::error!(
                "failed to persist session file {}: {}",
                self.session_file.display(),
                e
            );
        }
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

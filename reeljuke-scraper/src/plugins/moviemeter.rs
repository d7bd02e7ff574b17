//! MovieMeter metadata plugin.
//!
//! MovieMeter requires session-based authentication, handled by
//! [`SessionClient`]: the token is resumed from disk when possible and
//! renewed transparently. This plugin only maps service records onto the
//! movie record; all session bookkeeping lives in the client.

use std::sync::Arc;

use async_trait::async_trait;
use reeljuke_core::Movie;
use reeljuke_lib::{HostGate, Settings, trim_to_length};
use tokio::time::Duration;

use crate::error::ScrapeError;
use crate::plugin::MetadataPlugin;
use crate::plugins::imdb::IMDB_PLUGIN_ID;
use crate::session::{SessionApi, SessionClient};
use crate::types::{FilmDetail, FilmSummary, SessionHandshake};

pub const MOVIEMETER_PLUGIN_ID: &str = "moviemeter";
const WEB_HOST: &str = "www.moviemeter.nl";
const WS_URL: &str = "https://www.moviemeter.nl/ws";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP binding for the MovieMeter web service: JSON-shaped method calls
/// POSTed to one endpoint, each bracketed by a host slot.
pub struct MovieMeterApi {
    http: reqwest::Client,
    gate: Arc<HostGate>,
}

impl MovieMeterApi {
    pub fn new(gate: Arc<HostGate>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, gate }
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ScrapeError> {
        let _slot = self.gate.slot(WEB_HOST).await;

        let resp = self
            .http
            .post(WS_URL)
            .json(&serde_json::json!({ "method": method, "params": params }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::ServerError {
                host: WEB_HOST.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SessionApi for MovieMeterApi {
    async fn start_session(
        &self,
        api_key: &str,
    ) -> Result<Option<SessionHandshake>, ScrapeError> {
        let value = self
            .call("api.startSession", serde_json::json!([api_key]))
            .await?;
        if value.as_object().is_none_or(|map| map.is_empty()) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn search_films(
        &self,
        session_key: &str,
        title: &str,
    ) -> Result<Vec<FilmSummary>, ScrapeError> {
        let value = self
            .call("film.search", serde_json::json!([session_key, title]))
            .await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn film_details(
        &self,
        session_key: &str,
        film_id: &str,
    ) -> Result<FilmDetail, ScrapeError> {
        let value = self
            .call(
                "film.retrieveDetails",
                serde_json::json!([session_key, film_id]),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

pub struct MovieMeterPlugin {
    session: SessionClient,
    plot_max_length: usize,
    outline_max_length: usize,
}

impl MovieMeterPlugin {
    /// Fails when no API key is configured; the dispatcher then substitutes
    /// the default plugin.
    pub fn try_new(settings: &Settings, gate: Arc<HostGate>) -> Result<Self, ScrapeError> {
        let api_key = settings.moviemeter_api_key.clone().ok_or_else(|| {
            ScrapeError::Config("no MovieMeter API key configured".to_string())
        })?;
        let api = MovieMeterApi::new(gate);
        Ok(Self {
            session: SessionClient::open(Box::new(api), api_key, settings.session_file.clone()),
            plot_max_length: settings.plot_max_length,
            outline_max_length: settings.outline_max_length,
        })
    }

    /// Wire a plugin over an arbitrary session client (used by tests).
    pub fn with_session(session: SessionClient, settings: &Settings) -> Self {
        Self {
            session,
            plot_max_length: settings.plot_max_length,
            outline_max_length: settings.outline_max_length,
        }
    }

    fn apply(&self, movie: &mut Movie, detail: &FilmDetail) {
        if !detail.title.is_empty() {
            movie.title = detail.title.clone();
        }
        if movie.year.is_none() {
            movie.year = detail.year.clone();
        }
        if let Some(plot) = &detail.plot {
            movie.plot = Some(trim_to_length(plot, self.plot_max_length));
            movie.outline = Some(trim_to_length(plot, self.outline_max_length));
        }
        if let Some(average) = detail.average.as_ref().and_then(|v| v.parse::<f32>().ok()) {
            // MovieMeter rates 0-5; records carry 0-100.
            movie.rating = Some((average * 20.0).round().clamp(0.0, 100.0) as u8);
        }
        for genre in &detail.genres {
            movie.add_genre(genre.clone());
        }
        for actor in &detail.actors {
            movie.add_actor(actor.name.clone());
        }
        for director in &detail.directors {
            movie.add_director(director.name.clone());
        }
        if movie.country.is_none() {
            movie.country = detail.countries.first().map(|c| c.name.clone());
        }
        if movie.runtime.is_none() {
            movie.runtime = detail.duration.as_ref().map(|d| format!("{} min", d));
        }
        if movie.poster_url.is_none() {
            movie.poster_url = detail.thumbnail.clone();
        }
        // Cross-link the IMDb id; the service stores bare digits.
        if movie.id(IMDB_PLUGIN_ID).is_none() {
            if let Some(imdb) = &detail.imdb {
                if !imdb.is_empty() {
                    movie.set_id(IMDB_PLUGIN_ID, format!("tt{}", imdb));
                }
            }
        }
    }

    async fn find_details(&self, movie: &mut Movie) -> Option<FilmDetail> {
        if let Some(id) = movie.id(MOVIEMETER_PLUGIN_ID) {
            log::debug!("searching MovieMeter using id '{}'", id);
            return self.session.get_details_by_id(id).await;
        }

        log::debug!("searching MovieMeter using title '{}'", movie.title);
        let summary = self
            .session
            .get_by_title_and_year(&movie.title, movie.year.as_deref())
            .await?;
        movie.set_id(MOVIEMETER_PLUGIN_ID, &summary.film_id);
        self.session.get_details_by_id(&summary.film_id).await
    }
}

#[async_trait]
impl MetadataPlugin for MovieMeterPlugin {
    fn id(&self) -> &'static str {
        MOVIEMETER_PLUGIN_ID
    }

    fn host(&self) -> &'static str {
        WEB_HOST
    }

    async fn scan(&self, movie: &mut Movie) -> bool {
        match self.find_details(movie).await {
            Some(detail) => {
                self.apply(movie, &detail);
                true
            }
            None => {
                log::debug!("no MovieMeter match for '{}'", movie.title);
                false
            }
        }
    }

    fn scan_from_local_record(&self, record: &str, movie: &mut Movie) -> bool {
        static FILM_URL_RE: std::sync::LazyLock<regex::Regex> =
            std::sync::LazyLock::new(|| {
                regex::Regex::new(r"moviemeter\.nl/film/(\d+)").expect("valid regex")
            });
        match FILM_URL_RE.captures(record) {
            Some(caps) => {
                movie.set_id(MOVIEMETER_PLUGIN_ID, &caps[1]);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "../tests/moviemeter_tests.rs"]
mod tests;

//! Wire records for the MovieMeter web service.

use serde::Deserialize;

/// Result of a successful `api.startSession` handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionHandshake {
    pub session_key: String,
    /// Epoch seconds the session stays valid until.
    pub valid_till: u64,
}

/// Summary entry from a `film.search` call.
#[derive(Debug, Clone, Deserialize)]
pub struct FilmSummary {
    #[serde(rename = "filmId")]
    pub film_id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
}

/// A name field nested in detail responses (`{"name": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Full record from a `film.retrieveDetails` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilmDetail {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    /// IMDb id digits, without the `tt` prefix.
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    /// Runtime in minutes.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub actors: Vec<NamedEntry>,
    #[serde(default)]
    pub directors: Vec<NamedEntry>,
    #[serde(default)]
    pub countries: Vec<NamedEntry>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Average vote on a 0-5 scale, e.g. "3.4".
    #[serde(default)]
    pub average: Option<String>,
    #[serde(default)]
    pub votes_count: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

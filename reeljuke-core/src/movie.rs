//! The in-memory movie/show record populated by metadata plugins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::media_type::MediaType;

/// Id-map value that disables scanning for a record (user opt-out).
pub const ID_SKIP: &str = "-1";
/// Alternate disable sentinel accepted in id maps.
pub const ID_DISABLED: &str = "0";

/// One video file belonging to a record, with per-episode metadata slots
/// for TV content. A file may span several episodes (multi-part rips), so
/// titles and plots are keyed by episode number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieFile {
    pub filename: String,
    /// Season number; -1 for non-TV files.
    pub season: i32,
    pub first_episode: u32,
    pub last_episode: u32,
    #[serde(default)]
    pub episode_titles: HashMap<u32, String>,
    #[serde(default)]
    pub episode_plots: HashMap<u32, String>,
}

impl MovieFile {
    /// A plain single-part file with no episode information.
    pub fn single(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            season: -1,
            first_episode: 1,
            last_episode: 1,
            ..Default::default()
        }
    }

    /// A TV file covering `first..=last` episodes of `season`.
    pub fn episode_range(filename: impl Into<String>, season: i32, first: u32, last: u32) -> Self {
        Self {
            filename: filename.into(),
            season,
            first_episode: first,
            last_episode: last.max(first),
            ..Default::default()
        }
    }

    /// Episode numbers covered by this file.
    pub fn episodes(&self) -> impl Iterator<Item = u32> {
        self.first_episode..=self.last_episode
    }

    pub fn set_episode_title(&mut self, episode: u32, title: impl Into<String>) {
        self.episode_titles.insert(episode, title.into());
    }

    pub fn set_episode_plot(&mut self, episode: u32, plot: impl Into<String>) {
        self.episode_plots.insert(episode, plot.into());
    }

    /// True when the episode still has no title.
    pub fn needs_title(&self, episode: u32) -> bool {
        !self.episode_titles.contains_key(&episode)
    }
}

/// A movie or TV show record.
///
/// Plugins fill in whatever fields their source knows about; absent fields
/// stay `None`. External identifiers live in a map keyed by plugin id, so
/// one record can carry ids for several sources at once (a MovieMeter hit
/// cross-links the IMDb id, for example).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// Filename (without extension) the record was created from.
    pub base_filename: String,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<String>,
    pub release_date: Option<String>,
    pub plot: Option<String>,
    /// Short-form plot shown in index views.
    pub outline: Option<String>,
    /// Rating on a 0-100 scale.
    pub rating: Option<u8>,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub directors: Vec<String>,
    pub country: Option<String>,
    /// Production company or broadcast network.
    pub company: Option<String>,
    pub runtime: Option<String>,
    pub certification: Option<String>,
    pub poster_url: Option<String>,
    pub fanart_url: Option<String>,
    pub files: Vec<MovieFile>,
    media_type: MediaType,
    ids: HashMap<String, String>,
    scrape_library: bool,
}

impl Movie {
    /// Create a record for a title, typed as a movie until a scan says
    /// otherwise.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            base_filename: title.clone(),
            title,
            original_title: None,
            year: None,
            release_date: None,
            plot: None,
            outline: None,
            rating: None,
            genres: Vec::new(),
            cast: Vec::new(),
            directors: Vec::new(),
            country: None,
            company: None,
            runtime: None,
            certification: None,
            poster_url: None,
            fanart_url: None,
            files: Vec::new(),
            media_type: MediaType::Movie,
            ids: HashMap::new(),
            scrape_library: true,
        }
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Reclassify the record. Plugins call this when a source reveals the
    /// record is of a different kind than assumed.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        self.media_type = media_type;
    }

    /// External id this record carries for `plugin`, if any.
    pub fn id(&self, plugin: &str) -> Option<&str> {
        self.ids.get(plugin).map(String::as_str)
    }

    pub fn set_id(&mut self, plugin: impl Into<String>, id: impl Into<String>) {
        self.ids.insert(plugin.into(), id.into());
    }

    pub fn ids(&self) -> &HashMap<String, String> {
        &self.ids
    }

    pub fn scrape_library(&self) -> bool {
        self.scrape_library
    }

    pub fn set_scrape_library(&mut self, scrape: bool) {
        self.scrape_library = scrape;
    }

    /// True when this record must not be scanned: either the library-level
    /// opt-out is set, or any external id carries a disable sentinel
    /// ("0" or "-1").
    pub fn is_scrape_disabled(&self) -> bool {
        if !self.scrape_library {
            return true;
        }
        self.ids
            .values()
            .any(|id| id == ID_SKIP || id == ID_DISABLED)
    }

    pub fn add_genre(&mut self, genre: impl Into<String>) {
        let genre = genre.into();
        if !genre.is_empty() && !self.genres.iter().any(|g| g.eq_ignore_ascii_case(&genre)) {
            self.genres.push(genre);
        }
    }

    pub fn add_actor(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() && !self.cast.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            self.cast.push(name);
        }
    }

    pub fn add_director(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() && !self.directors.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            self.directors.push(name);
        }
    }

    pub fn add_file(&mut self, file: MovieFile) {
        self.files.push(file);
    }
}

#[cfg(test)]
#[path = "tests/movie_tests.rs"]
mod tests;

//! TVRage metadata plugin: the built-in TV show default.
//!
//! TVRage serves plain XML feeds: `search.php` to find a show id,
//! `showinfo.php` for show metadata, and `episode_list.php` for per-episode
//! titles and summaries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reeljuke_core::{MediaType, Movie};
use reeljuke_lib::{HostGate, decode_entities, trim_to_length};

use crate::error::ScrapeError;
use crate::plugin::MetadataPlugin;
use crate::web::PageFetcher;

pub const TVRAGE_PLUGIN_ID: &str = "tvrage";
const WEB_HOST: &str = "services.tvrage.com";
const FEED_BASE: &str = "http://services.tvrage.com/feeds";

const PLOT_MAX_LENGTH: usize = 500;

pub struct TvRagePlugin {
    fetcher: PageFetcher,
}

/// Show record from the search or showinfo feeds.
#[derive(Debug, Clone, Default)]
struct ShowInfo {
    show_id: String,
    name: String,
    started: Option<String>,
    origin_country: Option<String>,
    network: Option<String>,
    classification: Option<String>,
    runtime: Option<String>,
    summary: Option<String>,
    genres: Vec<String>,
}

impl ShowInfo {
    fn is_valid(&self) -> bool {
        !self.show_id.is_empty() && !self.name.is_empty()
    }
}

/// One episode from the episode_list feed.
#[derive(Debug, Clone, Default)]
struct EpisodeInfo {
    season: i32,
    number: u32,
    title: String,
    summary: Option<String>,
}

impl TvRagePlugin {
    pub fn new(gate: Arc<HostGate>) -> Self {
        Self {
            fetcher: PageFetcher::new(gate),
        }
    }

    async fn search_show(&self, title: &str) -> Option<Vec<ShowInfo>> {
        let url = format!("{FEED_BASE}/search.php?show={}", encode_query(title));
        match self.fetcher.fetch(&url).await {
            Ok(xml) => match parse_show_feed(&xml, "show") {
                Ok(shows) => Some(shows),
                Err(e) => {
                    log::error!("malformed TVRage search feed for '{}': {}", title, e);
                    None
                }
            },
            Err(e) => {
                log::error!("TVRage search for '{}' failed: {}", title, e);
                None
            }
        }
    }

    async fn show_info(&self, show_id: &str) -> Option<ShowInfo> {
        let url = format!("{FEED_BASE}/showinfo.php?sid={}", show_id);
        match self.fetcher.fetch(&url).await {
            Ok(xml) => match parse_show_feed(&xml, "Showinfo") {
                Ok(shows) => shows.into_iter().next(),
                Err(e) => {
                    log::error!("malformed TVRage showinfo feed for {}: {}", show_id, e);
                    None
                }
            },
            Err(e) => {
                log::error!("TVRage showinfo for {} failed: {}", show_id, e);
                None
            }
        }
    }

    async fn episode_list(&self, show_id: &str) -> Option<Vec<EpisodeInfo>> {
        let url = format!("{FEED_BASE}/episode_list.php?sid={}", show_id);
        match self.fetcher.fetch(&url).await {
            Ok(xml) => match parse_episode_list(&xml) {
                Ok(episodes) => Some(episodes),
                Err(e) => {
                    log::error!("malformed TVRage episode feed for {}: {}", show_id, e);
                    None
                }
            },
            Err(e) => {
                log::error!("TVRage episode list for {} failed: {}", show_id, e);
                None
            }
        }
    }

    /// Find the show for a record: by stored id when present, else by
    /// title, preferring an exact name match over the first result.
    async fn resolve_show(&self, movie: &Movie) -> Option<ShowInfo> {
        if let Some(id) = movie.id(TVRAGE_PLUGIN_ID) {
            log::debug!("searching TVRage using id '{}'", id);
            if let Some(show) = self.show_info(id).await {
                if show.is_valid() {
                    return Some(show);
                }
            }
        }

        log::debug!("searching TVRage using title '{}'", movie.title);
        let shows = self.search_show(&movie.title).await?;
        shows
            .iter()
            .find(|show| show.name.eq_ignore_ascii_case(&movie.title))
            .cloned()
            .or_else(|| shows.into_iter().next())
            .filter(ShowInfo::is_valid)
    }

    fn apply(&self, movie: &mut Movie, show: &ShowInfo) {
        movie.set_id(TVRAGE_PLUGIN_ID, &show.show_id);
        movie.set_media_type(MediaType::TvShow);
        if !show.name.is_empty() {
            movie.title = show.name.clone();
        }
        if movie.year.is_none() {
            movie.year = show
                .started
                .as_ref()
                .and_then(|date| extract_year(date).map(str::to_string));
        }
        if let Some(summary) = &show.summary {
            movie.plot = Some(trim_to_length(summary, PLOT_MAX_LENGTH));
        }
        for genre in &show.genres {
            movie.add_genre(genre.clone());
        }
        if movie.country.is_none() {
            movie.country = show.origin_country.clone();
        }
        if movie.company.is_none() {
            movie.company = show.network.clone();
        }
        if movie.certification.is_none() {
            movie.certification = show.classification.clone();
        }
        if movie.runtime.is_none() {
            movie.runtime = show.runtime.as_ref().map(|r| format!("{} min", r));
        }
    }
}

#[async_trait]
impl MetadataPlugin for TvRagePlugin {
    fn id(&self) -> &'static str {
        TVRAGE_PLUGIN_ID
    }

    fn host(&self) -> &'static str {
        WEB_HOST
    }

    async fn scan(&self, movie: &mut Movie) -> bool {
        match self.resolve_show(movie).await {
            Some(show) => {
                self.apply(movie, &show);
                true
            }
            None => {
                log::debug!("no TVRage match for '{}'", movie.title);
                false
            }
        }
    }

    fn scan_from_local_record(&self, record: &str, movie: &mut Movie) -> bool {
        // TVRage ids are bare numbers; only a tagged URL is unambiguous.
        static SHOW_URL_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
            regex::Regex::new(r"tvrage\.com/shows/id-(\d+)").expect("valid regex")
        });
        match SHOW_URL_RE.captures(record) {
            Some(caps) => {
                movie.set_id(TVRAGE_PLUGIN_ID, &caps[1]);
                true
            }
            None => false,
        }
    }

    async fn scan_show_episode_titles(&self, movie: &mut Movie) {
        let show_id = match movie.id(TVRAGE_PLUGIN_ID) {
            Some(id) => id.to_string(),
            None => {
                log::debug!(
                    "no TVRage id for '{}', cannot fill episode titles",
                    movie.title
                );
                return;
            }
        };
        let Some(episodes) = self.episode_list(&show_id).await else {
            return;
        };
        fill_episodes(movie, &episodes);
    }
}

/// Fill per-episode titles and plots from a parsed episode list. Existing
/// titles are kept; plots are refreshed.
fn fill_episodes(movie: &mut Movie, episodes: &[EpisodeInfo]) {
    let by_number: HashMap<(i32, u32), &EpisodeInfo> = episodes
        .iter()
        .map(|episode| ((episode.season, episode.number), episode))
        .collect();

    for file in &mut movie.files {
        if file.season < 0 {
            continue;
        }
        for part in file.first_episode..=file.last_episode {
            let Some(episode) = by_number.get(&(file.season, part)) else {
                continue;
            };
            if file.needs_title(part) {
                file.set_episode_title(part, episode.title.clone());
            }
            if let Some(summary) = &episode.summary {
                file.set_episode_plot(part, trim_to_length(summary, PLOT_MAX_LENGTH));
            }
        }
    }
}

/// Parse a search (`<Results><show>…`) or showinfo (`<Showinfo>…`) feed.
/// Both carry the same child elements, so one parser covers them; the
/// `container` tag decides where a show record starts and ends.
fn parse_show_feed(xml: &str, container: &str) -> Result<Vec<ShowInfo>, ScrapeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut shows = Vec::new();
    let mut current: Option<ShowInfo> = None;
    let mut current_tag = String::new();
    let mut in_genres = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == container {
                    current = Some(ShowInfo::default());
                } else if tag_name == "genres" {
                    in_genres = true;
                } else {
                    current_tag = tag_name;
                }
            }
            Event::Text(ref e) => {
                let text = decode_entities(e.unescape()?.trim());
                if text.is_empty() {
                    continue;
                }
                let Some(ref mut show) = current else {
                    continue;
                };
                if in_genres {
                    if current_tag == "genre" {
                        show.genres.push(text);
                    }
                    continue;
                }
                match current_tag.as_str() {
                    "showid" => show.show_id = text,
                    "name" | "showname" => show.name = text,
                    "started" => show.started = Some(text),
                    "origin_country" => show.origin_country = Some(text),
                    "network" => show.network = Some(text),
                    "classification" => show.classification = Some(text),
                    "runtime" => show.runtime = Some(text),
                    "summary" => show.summary = Some(text),
                    _ => {}
                }
            }
            Event::End(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == container {
                    if let Some(show) = current.take() {
                        shows.push(show);
                    }
                } else if tag_name == "genres" {
                    in_genres = false;
                } else {
                    current_tag.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shows)
}

/// Parse an episode_list feed: `<Season no="1"><episode>…`.
fn parse_episode_list(xml: &str) -> Result<Vec<EpisodeInfo>, ScrapeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut episodes = Vec::new();
    let mut season = 0i32;
    let mut current: Option<EpisodeInfo> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "Season" => {
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"no" {
                                season = String::from_utf8_lossy(&attr.value)
                                    .parse()
                                    .unwrap_or(0);
                            }
                        }
                    }
                    "episode" => {
                        current = Some(EpisodeInfo {
                            season,
                            ..Default::default()
                        });
                    }
                    _ => current_tag = tag_name,
                }
            }
            Event::Text(ref e) => {
                let text = decode_entities(e.unescape()?.trim());
                if text.is_empty() {
                    continue;
                }
                let Some(ref mut episode) = current else {
                    continue;
                };
                match current_tag.as_str() {
                    "seasonnum" => episode.number = text.parse().unwrap_or(0),
                    "title" => episode.title = text,
                    "summary" => episode.summary = Some(text),
                    _ => {}
                }
            }
            Event::End(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == "episode" {
                    if let Some(episode) = current.take() {
                        if episode.number > 0 && !episode.title.is_empty() {
                            episodes.push(episode);
                        }
                    }
                } else {
                    current_tag.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(episodes)
}

fn extract_year(date: &str) -> Option<&str> {
    // Feed dates look like "Sep/22/2004" or a bare year.
    date.rsplit('/')
        .next()
        .filter(|part| part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()))
}

fn encode_query(query: &str) -> String {
    let mut encoded = String::with_capacity(query.len());
    for c in query.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '&' => encoded.push_str("%26"),
            '?' => encoded.push_str("%3F"),
            '=' => encoded.push_str("%3D"),
            '#' => encoded.push_str("%23"),
            '+' => encoded.push_str("%2B"),
            _ => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
#[path = "../tests/tvrage_tests.rs"]
mod tests;

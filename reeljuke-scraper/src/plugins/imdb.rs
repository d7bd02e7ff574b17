//! IMDb metadata plugin: the built-in default, also the person scanner.
//!
//! Titles resolve through the find page to a `tt…` id; the title page
//! carries a JSON-LD metadata block that holds everything the record
//! needs. When the block identifies a TV series and the record is typed as
//! a movie, the record is reclassified and the scan reports "no data" so
//! the dispatcher reruns it with the TV plugin.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reeljuke_core::{FilmographyEntry, MediaType, Movie, Person};
use reeljuke_lib::{HostGate, Settings, decode_entities, strip_tags, trim_to_length};
use serde::Deserialize;

use crate::plugin::MetadataPlugin;
use crate::web::PageFetcher;

pub const IMDB_PLUGIN_ID: &str = "imdb";
const WEB_HOST: &str = "www.imdb.com";
const SITE: &str = "https://www.imdb.com";

static TITLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/title/(tt\d{7,8})/").expect("valid regex"));
static NAME_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/name/(nm\d{7,8})/").expect("valid regex"));
static LOCAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(tt\d{7,8})\b").expect("valid regex"));
static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script type="application/ld\+json">(.*?)</script>"#).expect("valid regex")
});
static TITLE_LINK_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+href="/title/tt\d{7,8}/[^"]*"[^>]*>([^<]+)</a>"#).expect("valid regex")
});
static ISO_DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").expect("valid regex"));

/// Credits carried in the metadata block cap out quickly; anything longer
/// needs the full credits page, which this plugin doesn't crawl.
const MAX_FILMOGRAPHY_ENTRIES: usize = 20;

pub struct ImdbPlugin {
    fetcher: PageFetcher,
    plot_max_length: usize,
    outline_max_length: usize,
}

/// A field that is sometimes a single object and sometimes an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn iter(&self) -> impl Iterator<Item = &T> {
        match self {
            Self::One(item) => std::slice::from_ref(item).iter(),
            Self::Many(items) => items.iter(),
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct CreditRef {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingBlock {
    #[serde(rename = "ratingValue")]
    rating_value: Option<f32>,
}

/// The JSON-LD metadata block on a title page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TitleDoc {
    #[serde(rename = "@type")]
    doc_type: String,
    name: String,
    #[serde(rename = "alternateName")]
    alternate_name: Option<String>,
    description: Option<String>,
    #[serde(rename = "datePublished")]
    date_published: Option<String>,
    #[serde(rename = "contentRating")]
    content_rating: Option<String>,
    genre: OneOrMany<String>,
    duration: Option<String>,
    image: Option<String>,
    actor: OneOrMany<CreditRef>,
    director: OneOrMany<CreditRef>,
    #[serde(rename = "aggregateRating")]
    aggregate_rating: Option<RatingBlock>,
}

impl TitleDoc {
    fn is_series(&self) -> bool {
        matches!(self.doc_type.as_str(), "TVSeries" | "TVMiniSeries")
    }
}

/// The JSON-LD metadata block on a name page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NameDoc {
    name: String,
    description: Option<String>,
    #[serde(rename = "birthDate")]
    birth_date: Option<String>,
    image: Option<String>,
}

impl ImdbPlugin {
    pub fn new(settings: &Settings, gate: Arc<HostGate>) -> Self {
        Self {
            fetcher: PageFetcher::new(gate),
            plot_max_length: settings.plot_max_length,
            outline_max_length: settings.outline_max_length,
        }
    }

    /// Resolve a title to an IMDb id through the find page.
    async fn search_title_id(&self, title: &str, year: Option<&str>) -> Option<String> {
        let query = match year {
            Some(year) => format!("{} {}", title, year),
            None => title.to_string(),
        };
        let url = search_url(&query, "tt")?;
        match self.fetcher.fetch(&url).await {
            Ok(page) => first_title_id(&page),
            Err(e) => {
                log::error!("IMDb search for '{}' failed: {}", title, e);
                None
            }
        }
    }

    async fn search_name_id(&self, name: &str) -> Option<String> {
        let url = search_url(name, "nm")?;
        match self.fetcher.fetch(&url).await {
            Ok(page) => NAME_ID_RE
                .captures(&page)
                .map(|caps| caps[1].to_string()),
            Err(e) => {
                log::error!("IMDb search for '{}' failed: {}", name, e);
                None
            }
        }
    }

    fn apply(&self, movie: &mut Movie, doc: &TitleDoc) {
        if !doc.name.is_empty() {
            movie.title = decode_entities(&doc.name);
        }
        if movie.original_title.is_none() {
            movie.original_title = doc.alternate_name.as_deref().map(decode_entities);
        }
        if let Some(date) = &doc.date_published {
            if movie.year.is_none() && date.len() >= 4 {
                movie.year = Some(date[..4].to_string());
            }
            movie.release_date = Some(date.clone());
        }
        if let Some(description) = &doc.description {
            let text = decode_entities(&strip_tags(description));
            movie.plot = Some(trim_to_length(&text, self.plot_max_length));
            movie.outline = Some(trim_to_length(&text, self.outline_max_length));
        }
        if let Some(rating) = doc
            .aggregate_rating
            .as_ref()
            .and_then(|block| block.rating_value)
        {
            // IMDb rates 0-10; records carry 0-100.
            movie.rating = Some((rating * 10.0).round().clamp(0.0, 100.0) as u8);
        }
        for genre in doc.genre.iter() {
            movie.add_genre(decode_entities(genre));
        }
        for actor in doc.actor.iter() {
            if let Some(name) = &actor.name {
                movie.add_actor(decode_entities(name));
            }
        }
        for director in doc.director.iter() {
            if let Some(name) = &director.name {
                movie.add_director(decode_entities(name));
            }
        }
        if movie.certification.is_none() {
            movie.certification = doc.content_rating.clone();
        }
        if movie.runtime.is_none() {
            movie.runtime = doc.duration.as_deref().and_then(parse_iso_duration);
        }
        if movie.poster_url.is_none() {
            movie.poster_url = doc.image.clone();
        }
    }
}

#[async_trait]
impl MetadataPlugin for ImdbPlugin {
    fn id(&self) -> &'static str {
        IMDB_PLUGIN_ID
    }

    fn host(&self) -> &'static str {
        WEB_HOST
    }

    async fn scan(&self, movie: &mut Movie) -> bool {
        let id = match movie.id(IMDB_PLUGIN_ID) {
            Some(id) => id.to_string(),
            None => {
                match self
                    .search_title_id(&movie.title, movie.year.as_deref())
                    .await
                {
                    Some(id) => {
                        movie.set_id(IMDB_PLUGIN_ID, &id);
                        id
                    }
                    None => {
                        log::debug!("no IMDb match for '{}'", movie.title);
                        return false;
                    }
                }
            }
        };

        let page = match self.fetcher.fetch(&format!("{SITE}/title/{id}/")).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("failed to fetch IMDb title page for {}: {}", id, e);
                return false;
            }
        };
        let doc: TitleDoc = match extract_json_ld(&page) {
            Some(doc) => doc,
            None => {
                log::error!("IMDb title page for {} carried no metadata block", id);
                return false;
            }
        };

        if doc.is_series() && movie.media_type() != MediaType::TvShow {
            log::debug!("'{}' identified as a TV series, reclassifying", movie.title);
            movie.set_media_type(MediaType::TvShow);
            return false;
        }

        self.apply(movie, &doc);
        true
    }

    async fn scan_person(&self, person: &mut Person) -> bool {
        let id = match person.id(IMDB_PLUGIN_ID) {
            Some(id) => id.to_string(),
            None => match self.search_name_id(&person.name).await {
                Some(id) => {
                    person.set_id(IMDB_PLUGIN_ID, &id);
                    id
                }
                None => {
                    log::debug!("no IMDb match for person '{}'", person.name);
                    return false;
                }
            },
        };

        let page = match self.fetcher.fetch(&format!("{SITE}/name/{id}/")).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("failed to fetch IMDb name page for {}: {}", id, e);
                return false;
            }
        };
        let doc: NameDoc = match extract_json_ld(&page) {
            Some(doc) => doc,
            None => {
                log::error!("IMDb name page for {} carried no metadata block", id);
                return false;
            }
        };

        if person.name.is_empty() {
            person.name = decode_entities(&doc.name);
        }
        if person.biography.is_none() {
            person.biography = doc
                .description
                .as_deref()
                .map(|text| decode_entities(&strip_tags(text)));
        }
        if person.birthday.is_none() {
            person.birthday = doc.birth_date.clone();
        }
        if person.photo_url.is_none() {
            person.photo_url = doc.image.clone();
        }
        for title in known_for_titles(&page) {
            person.add_credit(FilmographyEntry::new(title));
        }
        true
    }

    fn scan_from_local_record(&self, record: &str, movie: &mut Movie) -> bool {
        match LOCAL_ID_RE.captures(record) {
            Some(caps) => {
                log::debug!("found IMDb id {} in local record", &caps[1]);
                movie.set_id(IMDB_PLUGIN_ID, &caps[1]);
                true
            }
            None => false,
        }
    }
}

fn search_url(query: &str, kind: &str) -> Option<String> {
    reqwest::Url::parse_with_params(&format!("{SITE}/find/"), &[("q", query), ("s", kind)])
        .ok()
        .map(String::from)
}

fn first_title_id(page: &str) -> Option<String> {
    TITLE_ID_RE.captures(page).map(|caps| caps[1].to_string())
}

/// Extract and parse the first JSON-LD block on a page.
fn extract_json_ld<T: serde::de::DeserializeOwned>(page: &str) -> Option<T> {
    let block = JSON_LD_RE.captures(page)?;
    match serde_json::from_str(&block[1]) {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::debug!("failed to parse metadata block: {}", e);
            None
        }
    }
}

/// Titles linked from the "known for" strip on a name page.
fn known_for_titles(page: &str) -> Vec<String> {
    let mut titles = Vec::new();
    for caps in TITLE_LINK_TEXT_RE.captures_iter(page) {
        let title = decode_entities(caps[1].trim());
        if !title.is_empty() && !titles.contains(&title) {
            titles.push(title);
        }
        if titles.len() >= MAX_FILMOGRAPHY_ENTRIES {
            break;
        }
    }
    titles
}

/// Convert an ISO-8601 duration like `PT2H22M` to a `142 min` string.
fn parse_iso_duration(duration: &str) -> Option<String> {
    let caps = ISO_DURATION_RE.captures(duration)?;
    let hours: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let minutes: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let total = hours * 60 + minutes;
    if total == 0 {
        return None;
    }
    Some(format!("{} min", total))
}

#[cfg(test)]
#[path = "../tests/imdb_tests.rs"]
mod tests;

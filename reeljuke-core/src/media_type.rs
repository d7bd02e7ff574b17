/// Content-type discriminator selecting which metadata plugin handles a
/// record.
///
/// This enum centralizes the content-type keys (configuration names,
/// display names, aliases) in one place, replacing ad-hoc string
/// matching throughout the codebase. `Unknown` is the starting state for
/// records whose kind has not been established; a plugin may reclassify a
/// record mid-scan (a title believed to be a movie turns out to be a TV
/// show), which the dispatcher answers with one retry using the plugin for
/// the new type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MediaType {
    Movie,
    TvShow,
    Person,
    Unknown,
}

/// The content types a plugin can be configured for.
const SCANNABLE_TYPES: &[MediaType] = &[MediaType::Movie, MediaType::TvShow, MediaType::Person];

impl MediaType {
    /// Canonical key used in configuration and listings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::TvShow => "tvshow",
            Self::Person => "person",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::TvShow => "TV Show",
            Self::Person => "Person",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this is a concrete type a plugin can be dispatched for.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// All types that map to a configured plugin.
    pub fn scannable() -> &'static [MediaType] {
        SCANNABLE_TYPES
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a string doesn't name a known content type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown content type: {input}")]
pub struct MediaTypeParseError {
    pub input: String,
}

impl std::str::FromStr for MediaType {
    type Err = MediaTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "film" => Ok(Self::Movie),
            "tvshow" | "tv-show" | "tv" | "series" => Ok(Self::TvShow),
            "person" => Ok(Self::Person),
            "unknown" => Ok(Self::Unknown),
            _ => Err(MediaTypeParseError {
                input: s.to_string(),
            }),
        }
    }
}

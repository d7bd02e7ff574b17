//! Shared application settings (plugin selection, rate limits, API keys).
//!
//! Settings load from `~/.config/reeljuke/settings.toml`, with `REELJUKE_*`
//! environment variables taking priority over the file. Missing values fall
//! back to built-in defaults, so loading never fails.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::host_gate::DEFAULT_SLOT_RULES;

pub const DEFAULT_MOVIE_PLUGIN: &str = "imdb";
pub const DEFAULT_TV_PLUGIN: &str = "tvrage";
pub const DEFAULT_PERSON_PLUGIN: &str = "imdb";
const DEFAULT_PLOT_MAX_LENGTH: usize = 500;
const DEFAULT_OUTLINE_MAX_LENGTH: usize = 300;

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Plugin name handling movie records.
    pub movie_plugin: String,
    /// Plugin name handling TV show records.
    pub tv_plugin: String,
    /// Plugin name handling person records.
    pub person_plugin: String,
    /// Per-host download slot rules (see [`crate::HostGate`]).
    pub download_slots: String,
    /// API key for the MovieMeter session handshake.
    pub moviemeter_api_key: Option<String>,
    /// Where the MovieMeter session token is persisted.
    pub session_file: PathBuf,
    pub plot_max_length: usize,
    pub outline_max_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movie_plugin: DEFAULT_MOVIE_PLUGIN.to_string(),
            tv_plugin: DEFAULT_TV_PLUGIN.to_string(),
            person_plugin: DEFAULT_PERSON_PLUGIN.to_string(),
            download_slots: DEFAULT_SLOT_RULES.to_string(),
            moviemeter_api_key: None,
            session_file: default_session_file(),
            plot_max_length: DEFAULT_PLOT_MAX_LENGTH,
            outline_max_length: DEFAULT_OUTLINE_MAX_LENGTH,
        }
    }
}

/// TOML settings file format. All fields optional.
#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsFile {
    plugins: Option<PluginsSection>,
    scraping: Option<ScrapingSection>,
    moviemeter: Option<MovieMeterSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct PluginsSection {
    movie: Option<String>,
    tvshow: Option<String>,
    person: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ScrapingSection {
    download_slots: Option<String>,
    plot_max_length: Option<usize>,
    outline_max_length: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct MovieMeterSection {
    api_key: Option<String>,
    session_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the canonical config file and the environment.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    /// Load settings from a specific file path plus environment overrides.
    /// A missing or malformed file just means defaults.
    pub fn load_from(path: &Path) -> Self {
        let file = read_settings_file(path).unwrap_or_default();
        let mut settings = Self::default();

        if let Some(plugins) = file.plugins {
            apply(&mut settings.movie_plugin, plugins.movie);
            apply(&mut settings.tv_plugin, plugins.tvshow);
            apply(&mut settings.person_plugin, plugins.person);
        }
        if let Some(scraping) = file.scraping {
            apply(&mut settings.download_slots, scraping.download_slots);
            apply(&mut settings.plot_max_length, scraping.plot_max_length);
            apply(
                &mut settings.outline_max_length,
                scraping.outline_max_length,
            );
        }
        if let Some(moviemeter) = file.moviemeter {
            settings.moviemeter_api_key = moviemeter.api_key;
            apply(&mut settings.session_file, moviemeter.session_file);
        }

        settings.apply_env()
    }

    /// Environment variables take priority over the settings file.
    fn apply_env(mut self) -> Self {
        if let Ok(value) = std::env::var("REELJUKE_MOVIE_PLUGIN") {
            self.movie_plugin = value;
        }
        if let Ok(value) = std::env::var("REELJUKE_TV_PLUGIN") {
            self.tv_plugin = value;
        }
        if let Ok(value) = std::env::var("REELJUKE_PERSON_PLUGIN") {
            self.person_plugin = value;
        }
        if let Ok(value) = std::env::var("REELJUKE_DOWNLOAD_SLOTS") {
            self.download_slots = value;
        }
        if let Ok(value) = std::env::var("REELJUKE_MOVIEMETER_API_KEY") {
            self.moviemeter_api_key = Some(value);
        }
        if let Ok(value) = std::env::var("REELJUKE_SESSION_FILE") {
            self.session_file = PathBuf::from(value);
        }
        self
    }
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn read_settings_file(path: &Path) -> Option<SettingsFile> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&contents) {
        Ok(file) => Some(file),
        Err(e) => {
            log::warn!("ignoring malformed settings file {}: {}", path.display(), e);
            None
        }
    }
}

/// Canonical path to the settings file: `~/.config/reeljuke/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("reeljuke").join("settings.toml")
}

/// Default location for the persisted MovieMeter session token.
fn default_session_file() -> PathBuf {
    let cache = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    cache.join("reeljuke").join("moviemeter.session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_exists() {
        let settings = Settings::load_from(Path::new("/nonexistent/settings.toml"));
        assert_eq!(settings.movie_plugin, DEFAULT_MOVIE_PLUGIN);
        assert_eq!(settings.tv_plugin, DEFAULT_TV_PLUGIN);
        assert_eq!(settings.download_slots, DEFAULT_SLOT_RULES);
        assert_eq!(settings.plot_max_length, DEFAULT_PLOT_MAX_LENGTH);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[plugins]
movie = "moviemeter"

[scraping]
download_slots = ".*=2"
plot_max_length = 200

[moviemeter]
api_key = "abc123"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.movie_plugin, "moviemeter");
        assert_eq!(settings.tv_plugin, DEFAULT_TV_PLUGIN);
        assert_eq!(settings.download_slots, ".*=2");
        assert_eq!(settings.plot_max_length, 200);
        assert_eq!(settings.outline_max_length, DEFAULT_OUTLINE_MAX_LENGTH);
        assert_eq!(settings.moviemeter_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "this is not toml [[[").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.movie_plugin, DEFAULT_MOVIE_PLUGIN);
    }
}

//! Plugin resolution and scan dispatch.
//!
//! A [`PluginRegistry`] maps configuration names to factory functions; a
//! [`PluginSet`] is the result of resolving the registry against the
//! settings once for a scan session: one plugin per content type, passed
//! around explicitly rather than living in hidden global state.

use std::collections::HashMap;
use std::sync::Arc;

use reeljuke_core::{MediaType, Movie, Person};
use reeljuke_lib::{HostGate, Settings};

use crate::error::ScrapeError;
use crate::plugin::MetadataPlugin;
use crate::plugins::{ImdbPlugin, MovieMeterPlugin, TvRagePlugin};

/// Builds one plugin instance from the settings and the shared host gate.
pub type PluginFactory =
    fn(&Settings, Arc<HostGate>) -> Result<Box<dyn MetadataPlugin>, ScrapeError>;

/// Name-to-factory table for the available plugins.
pub struct PluginRegistry {
    factories: HashMap<&'static str, PluginFactory>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginRegistry {
    /// An empty registry with no plugins registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The registry with all built-in plugins registered.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("imdb", |settings, gate| {
            Ok(Box::new(ImdbPlugin::new(settings, gate)))
        });
        registry.register("tvrage", |_settings, gate| {
            Ok(Box::new(TvRagePlugin::new(gate)))
        });
        registry.register("moviemeter", |settings, gate| {
            Ok(Box::new(MovieMeterPlugin::try_new(settings, gate)?))
        });
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: PluginFactory) {
        self.factories.insert(name, factory);
    }

    /// Registered plugin names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the plugin registered under `name`. An unknown name or a
    /// failing factory is recovered locally: the error is logged and the
    /// built-in default IMDb plugin is substituted.
    fn instantiate(
        &self,
        name: &str,
        settings: &Settings,
        gate: &Arc<HostGate>,
    ) -> Box<dyn MetadataPlugin> {
        match self.factories.get(name) {
            Some(factory) => match factory(settings, gate.clone()) {
                Ok(plugin) => return plugin,
                Err(e) => {
                    log::error!(
                        "failed to construct metadata plugin '{}': {}; using the default IMDb plugin instead",
                        name,
                        e
                    );
                }
            },
            None => {
                log::error!(
                    "no metadata plugin registered under '{}'; using the default IMDb plugin instead",
                    name
                );
            }
        }
        Box::new(ImdbPlugin::new(settings, gate.clone()))
    }
}

/// The resolved plugin per content type for one scan session.
pub struct PluginSet {
    movie: Box<dyn MetadataPlugin>,
    tv: Box<dyn MetadataPlugin>,
    person: Box<dyn MetadataPlugin>,
}

impl PluginSet {
    /// Resolve the configured plugin for every content type. Each key is
    /// resolved exactly once; misconfigured keys fall back to the default
    /// plugin (see [`PluginRegistry::instantiate`]).
    pub fn resolve(registry: &PluginRegistry, settings: &Settings, gate: Arc<HostGate>) -> Self {
        Self {
            movie: registry.instantiate(&settings.movie_plugin, settings, &gate),
            tv: registry.instantiate(&settings.tv_plugin, settings, &gate),
            person: registry.instantiate(&settings.person_plugin, settings, &gate),
        }
    }

    /// Wire a set directly from plugin instances.
    pub fn from_parts(
        movie: Box<dyn MetadataPlugin>,
        tv: Box<dyn MetadataPlugin>,
        person: Box<dyn MetadataPlugin>,
    ) -> Self {
        Self { movie, tv, person }
    }

    /// The plugin handling the given content type. `Unknown` maps to the
    /// movie plugin, though dispatch never scans unknown-typed records.
    pub fn plugin_for(&self, media_type: MediaType) -> &dyn MetadataPlugin {
        match media_type {
            MediaType::Movie | MediaType::Unknown => self.movie.as_ref(),
            MediaType::TvShow => self.tv.as_ref(),
            MediaType::Person => self.person.as_ref(),
        }
    }

    /// Scan a record with the plugin for its declared type.
    ///
    /// If the scan reports no data AND reclassified the record to a
    /// different known type, it is retried exactly once with the plugin for
    /// the new type (a scraper may discover mid-scan that a title believed
    /// to be a movie is actually a TV show). No further retries happen;
    /// fields applied by the first attempt are not rolled back.
    pub async fn scan(&self, movie: &mut Movie) -> bool {
        if movie.is_scrape_disabled() {
            log::debug!("skipping internet search for {}", movie.base_filename);
            return false;
        }

        let original_type = movie.media_type();
        if !original_type.is_known() {
            return false;
        }

        let mut scanned = self.plugin_for(original_type).scan(movie).await;

        let new_type = movie.media_type();
        if !scanned && new_type.is_known() && new_type != original_type {
            scanned = self.plugin_for(new_type).scan(movie).await;
            if !scanned {
                log::warn!(
                    "'{}' could not be scanned by the configured plugins",
                    movie.title
                );
            }
        }
        scanned
    }

    /// Scan a person record with the configured person plugin.
    pub async fn scan_person(&self, person: &mut Person) -> bool {
        if person.is_scrape_disabled() {
            log::debug!("skipping internet search for {}", person.name);
            return false;
        }
        let scanned = self.person.scan_person(person).await;
        if !scanned {
            log::warn!(
                "person '{}' could not be scanned by the configured plugins",
                person.name
            );
        }
        scanned
    }

    /// Parse a local record (e.g. an .nfo file) with the plugin for the
    /// record's current type.
    pub fn scan_from_local_record(&self, record: &str, movie: &mut Movie) -> bool {
        self.plugin_for(movie.media_type())
            .scan_from_local_record(record, movie)
    }

    /// Fill per-episode titles for a show via the TV plugin.
    pub async fn scan_show_episode_titles(&self, movie: &mut Movie) {
        self.tv.scan_show_episode_titles(movie).await;
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;

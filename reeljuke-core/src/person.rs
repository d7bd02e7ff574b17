use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::movie::{ID_DISABLED, ID_SKIP};

/// One credit in a person's filmography.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilmographyEntry {
    pub title: String,
    pub year: Option<String>,
    /// Job on the production (actor, director, writer, ...).
    pub job: Option<String>,
    pub character: Option<String>,
}

impl FilmographyEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A person record (actor, director, ...) populated by metadata plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub birthplace: Option<String>,
    pub photo_url: Option<String>,
    pub filmography: Vec<FilmographyEntry>,
    ids: HashMap<String, String>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn id(&self, plugin: &str) -> Option<&str> {
        self.ids.get(plugin).map(String::as_str)
    }

    pub fn set_id(&mut self, plugin: impl Into<String>, id: impl Into<String>) {
        self.ids.insert(plugin.into(), id.into());
    }

    pub fn ids(&self) -> &HashMap<String, String> {
        &self.ids
    }

    /// True when any external id carries a disable sentinel.
    pub fn is_scrape_disabled(&self) -> bool {
        self.ids
            .values()
            .any(|id| id == ID_SKIP || id == ID_DISABLED)
    }

    pub fn add_credit(&mut self, entry: FilmographyEntry) {
        if !self
            .filmography
            .iter()
            .any(|e| e.title.eq_ignore_ascii_case(&entry.title))
        {
            self.filmography.push(entry);
        }
    }
}

//! The contract every metadata source implements.

use async_trait::async_trait;
use reeljuke_core::{Movie, Person};

/// A metadata source that can fill in movie or person records.
///
/// Implementations never let remote failures escape: a failed lookup logs
/// the cause and reports `false`, leaving the record untouched or partially
/// filled. The dispatcher treats every plugin through this interface only.
#[async_trait]
pub trait MetadataPlugin: Send + Sync {
    /// Registry name for this plugin, also its key in record id maps
    /// (e.g. "imdb").
    fn id(&self) -> &'static str;

    /// Remote host this plugin talks to, used as the rate-gate key.
    fn host(&self) -> &'static str;

    /// Fetch and apply metadata for a movie or show. `true` when data was
    /// found and applied.
    async fn scan(&self, movie: &mut Movie) -> bool;

    /// Fetch and apply metadata for a person. `true` when data was found.
    async fn scan_person(&self, _person: &mut Person) -> bool {
        false
    }

    /// Pull identifiers out of an already-available local record such as an
    /// .nfo file. `true` when an id for this plugin was recognized.
    fn scan_from_local_record(&self, _record: &str, _movie: &mut Movie) -> bool {
        false
    }

    /// Fill per-episode titles and plots for a show's files.
    async fn scan_show_episode_titles(&self, _movie: &mut Movie) {}
}

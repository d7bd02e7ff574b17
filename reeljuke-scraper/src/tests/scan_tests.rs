use super::*;

use async_trait::async_trait;
use reeljuke_core::{ID_SKIP, Person};

use crate::dispatch::PluginSet;
use crate::plugin::MetadataPlugin;

/// Plugin that recognizes a fixed set of titles.
struct KnownTitles(&'static [&'static str]);

#[async_trait]
impl MetadataPlugin for KnownTitles {
    fn id(&self) -> &'static str {
        "known"
    }

    fn host(&self) -> &'static str {
        "known.example"
    }

    async fn scan(&self, movie: &mut Movie) -> bool {
        if self.0.contains(&movie.title.as_str()) {
            movie.plot = Some("found".to_string());
            true
        } else {
            false
        }
    }

    async fn scan_person(&self, _person: &mut Person) -> bool {
        false
    }
}

fn plugin_set(titles: &'static [&'static str]) -> PluginSet {
    PluginSet::from_parts(
        Box::new(KnownTitles(titles)),
        Box::new(KnownTitles(titles)),
        Box::new(KnownTitles(&[])),
    )
}

#[tokio::test]
async fn scan_all_collects_outcomes() {
    let plugins = plugin_set(&["Heat", "The Office"]);
    let mut movies = vec![
        Movie::new("Heat"),
        Movie::new("Unknown Obscurity"),
        Movie::new("The Office"),
    ];
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let log = scan_all(&plugins, &mut movies, 2, events_tx).await;
    let summary = log.summary();
    assert_eq!(summary.found, 2);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.skipped, 0);

    assert_eq!(movies[0].plot.as_deref(), Some("found"));
    assert!(movies[1].plot.is_none());

    let mut saw_done = false;
    while let Some(event) = events_rx.recv().await {
        if matches!(event, ScanEvent::Done) {
            saw_done = true;
        }
    }
    assert!(saw_done);
}

#[tokio::test]
async fn disabled_records_are_skipped_without_scanning() {
    let plugins = plugin_set(&["Heat"]);
    let mut opted_out = Movie::new("Heat");
    opted_out.set_id("imdb", ID_SKIP);
    let mut movies = vec![opted_out];
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let log = scan_all(&plugins, &mut movies, 4, events_tx).await;
    assert_eq!(log.summary().skipped, 1);
    // The plugin never ran, so nothing was applied.
    assert!(movies[0].plot.is_none());

    let mut saw_skip = false;
    while let Some(event) = events_rx.recv().await {
        if matches!(event, ScanEvent::Skipped { .. }) {
            saw_skip = true;
        }
    }
    assert!(saw_skip);
}

#[tokio::test]
async fn log_file_carries_summary_and_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.log");

    let mut log = ScanLog::new();
    log.add(ScanLogEntry::Found {
        title: "Heat".to_string(),
        media_type: MediaType::Movie,
    });
    log.add(ScanLogEntry::NotFound {
        title: "Obscure".to_string(),
    });
    log.write_to_file(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Found: 1"));
    assert!(contents.contains("[OK] Heat (Movie)"));
    assert!(contents.contains("[NOT FOUND] Obscure"));
}

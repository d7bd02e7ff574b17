//! Concurrent scan orchestration over many records.

use std::path::Path;

use futures::stream::{self, StreamExt};
use reeljuke_core::{MediaType, Movie};
use tokio::sync::mpsc;

use crate::dispatch::PluginSet;

/// Progress events emitted while scanning, consumed by the CLI.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A record has started scanning (assigned to a worker).
    Started { index: usize, title: String },
    /// A record finished; `found` tells whether any plugin applied data.
    Completed {
        index: usize,
        title: String,
        found: bool,
    },
    /// A record was skipped (scrape opt-out or skip sentinel id).
    Skipped { index: usize, title: String },
    /// All records processed.
    Done,
}

/// A single entry in the scan log.
#[derive(Debug, Clone)]
pub enum ScanLogEntry {
    Found {
        title: String,
        media_type: MediaType,
    },
    NotFound {
        title: String,
    },
    Skipped {
        title: String,
    },
}

/// Collects per-record outcomes and writes a log file.
#[derive(Debug, Default)]
pub struct ScanLog {
    entries: Vec<ScanLogEntry>,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub found: usize,
    pub not_found: usize,
    pub skipped: usize,
}

impl ScanLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ScanLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ScanLogEntry] {
        &self.entries
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for entry in &self.entries {
            match entry {
                ScanLogEntry::Found { .. } => summary.found += 1,
                ScanLogEntry::NotFound { .. } => summary.not_found += 1,
                ScanLogEntry::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }

    /// Write the log to a file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::fs::File::create(path)?;
        let summary = self.summary();

        writeln!(file, "=== Scan Log ===")?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;
        writeln!(file, "Found: {}", summary.found)?;
        writeln!(file, "Not found: {}", summary.not_found)?;
        writeln!(file, "Skipped: {}", summary.skipped)?;
        writeln!(file)?;

        for entry in &self.entries {
            match entry {
                ScanLogEntry::Found { title, media_type } => {
                    writeln!(file, "[OK] {} ({})", title, media_type.display_name())?;
                }
                ScanLogEntry::NotFound { title } => {
                    writeln!(file, "[NOT FOUND] {}", title)?;
                }
                ScanLogEntry::Skipped { title } => {
                    writeln!(file, "[SKIPPED] {}", title)?;
                }
            }
        }
        Ok(())
    }
}

/// Scan every record with a bounded number of concurrent workers.
///
/// Each worker runs the full dispatch (including the reclassification
/// retry) for one record; TV records additionally get their episode titles
/// filled. There is no cancellation: once started, every record runs to
/// completion or failure.
pub async fn scan_all(
    plugins: &PluginSet,
    movies: &mut [Movie],
    max_workers: usize,
    events: mpsc::UnboundedSender<ScanEvent>,
) -> ScanLog {
    let outcomes: Vec<ScanLogEntry> = stream::iter(movies.iter_mut().enumerate())
        .map(|(index, movie)| {
            let events = events.clone();
            async move {
                if movie.is_scrape_disabled() {
                    let _ = events.send(ScanEvent::Skipped {
                        index,
                        title: movie.title.clone(),
                    });
                    return ScanLogEntry::Skipped {
                        title: movie.title.clone(),
                    };
                }

                let _ = events.send(ScanEvent::Started {
                    index,
                    title: movie.title.clone(),
                });

                let found = plugins.scan(movie).await;
                if found && movie.media_type() == MediaType::TvShow {
                    plugins.scan_show_episode_titles(movie).await;
                }

                let _ = events.send(ScanEvent::Completed {
                    index,
                    title: movie.title.clone(),
                    found,
                });

                if found {
                    ScanLogEntry::Found {
                        title: movie.title.clone(),
                        media_type: movie.media_type(),
                    }
                } else {
                    ScanLogEntry::NotFound {
                        title: movie.title.clone(),
                    }
                }
            }
        })
        .buffer_unordered(max_workers.max(1))
        .collect()
        .await;

    let _ = events.send(ScanEvent::Done);

    let mut log = ScanLog::new();
    for outcome in outcomes {
        log.add(outcome);
    }
    log
}

#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod tests;

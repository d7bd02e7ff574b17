//! reeljuke CLI
//!
//! Command-line interface for scraping movie and TV metadata from online
//! databases.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reeljuke_core::{MediaType, Movie, Person};
use reeljuke_lib::{HostGate, Settings};
use reeljuke_scraper::{PluginRegistry, PluginSet, ScanEvent, scan_all, write_listing};

#[derive(Parser)]
#[command(name = "reeljuke")]
#[command(about = "Scrape movie and TV metadata from online databases", long_about = None)]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan titles and print the metadata found
    Scan {
        /// Titles to scan
        #[arg(required = true)]
        titles: Vec<String>,

        /// Content type of the titles (movie, tvshow, person)
        #[arg(short = 't', long, default_value = "movie")]
        media_type: MediaType,

        /// Year hint, applied when scanning a single title
        #[arg(short, long)]
        year: Option<String>,

        /// Number of concurrent scan workers
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Local record (.nfo) to pull identifiers from, applied when
        /// scanning a single title
        #[arg(long)]
        nfo: Option<PathBuf>,

        /// Write a CSV listing of the scanned records
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a scan log file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// List the registered metadata plugins and the configured selection
    Plugins,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    match cli.command {
        Commands::Scan {
            titles,
            media_type,
            year,
            workers,
            nfo,
            csv,
            log_file,
        } => {
            let options = ScanArgs {
                titles,
                media_type,
                year,
                workers,
                nfo,
                csv,
                log_file,
            };
            run_scan(&settings, options).await;
        }
        Commands::Plugins => {
            run_plugins(&settings);
        }
    }
}

fn resolve_plugins(settings: &Settings) -> PluginSet {
    let gate = Arc::new(HostGate::new(&settings.download_slots));
    let registry = PluginRegistry::builtin();
    PluginSet::resolve(&registry, settings, gate)
}

/// Arguments collected from the `scan` subcommand.
struct ScanArgs {
    titles: Vec<String>,
    media_type: MediaType,
    year: Option<String>,
    workers: usize,
    nfo: Option<PathBuf>,
    csv: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

async fn run_scan(settings: &Settings, args: ScanArgs) {
    let ScanArgs {
        titles,
        media_type,
        year,
        workers,
        nfo,
        csv,
        log_file,
    } = args;
    let plugins = resolve_plugins(settings);

    if media_type == MediaType::Person {
        scan_people(&plugins, titles).await;
        return;
    }

    let mut movies: Vec<Movie> = titles
        .iter()
        .map(|title| {
            let mut movie = Movie::new(title.clone()).with_media_type(media_type);
            if titles.len() == 1 {
                if let Some(year) = &year {
                    movie.year = Some(year.clone());
                }
            }
            movie
        })
        .collect();

    // A local record can pin the external id before any search happens.
    if let (Some(path), [movie]) = (&nfo, movies.as_mut_slice()) {
        match std::fs::read_to_string(path) {
            Ok(record) => {
                if plugins.scan_from_local_record(&record, movie) {
                    log::debug!("local record pinned an id for '{}'", movie.title);
                }
            }
            Err(e) => eprintln!("could not read {}: {}", path.display(), e),
        }
    }

    let bar = ProgressBar::new(movies.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let progress = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    ScanEvent::Started { title, .. } => bar.set_message(title),
                    ScanEvent::Completed { .. } | ScanEvent::Skipped { .. } => bar.inc(1),
                    ScanEvent::Done => break,
                }
            }
        })
    };

    let log = scan_all(&plugins, &mut movies, workers, events_tx).await;
    let _ = progress.await;
    bar.finish_and_clear();

    for movie in &movies {
        print_movie(movie);
    }

    let summary = log.summary();
    println!(
        "{} found, {} not found, {} skipped",
        summary
            .found
            .if_supports_color(Stdout, |n| n.green().to_string()),
        summary.not_found,
        summary.skipped,
    );

    if let Some(path) = csv {
        match write_listing(&path, &movies) {
            Ok(()) => println!("listing written to {}", path.display()),
            Err(e) => eprintln!("failed to write listing: {}", e),
        }
    }
    if let Some(path) = log_file {
        if let Err(e) = log.write_to_file(&path) {
            eprintln!("failed to write scan log: {}", e);
        }
    }
}

async fn scan_people(plugins: &PluginSet, names: Vec<String>) {
    for name in names {
        let mut person = Person::new(name);
        if plugins.scan_person(&mut person).await {
            print_person(&person);
        } else {
            println!(
                "{} {}",
                "not found:".if_supports_color(Stdout, |s| s.red().to_string()),
                person.name
            );
        }
    }
}

fn print_movie(movie: &Movie) {
    let header = match movie.year.as_deref() {
        Some(year) => format!("{} ({})", movie.title, year),
        None => movie.title.clone(),
    };
    println!(
        "{}",
        header.if_supports_color(Stdout, |h| h.bold().to_string())
    );
    println!("  type:   {}", movie.media_type().display_name());
    if let Some(rating) = movie.rating {
        println!("  rating: {}/100", rating);
    }
    if !movie.genres.is_empty() {
        println!("  genres: {}", movie.genres.join(", "));
    }
    if !movie.directors.is_empty() {
        println!("  director: {}", movie.directors.join(", "));
    }
    if !movie.cast.is_empty() {
        println!("  cast:   {}", movie.cast.join(", "));
    }
    if let Some(runtime) = &movie.runtime {
        println!("  runtime: {}", runtime);
    }
    if let Some(outline) = movie.outline.as_deref().or(movie.plot.as_deref()) {
        println!("  {}", outline);
    }
    for (plugin, id) in movie.ids() {
        println!("  id[{}]: {}", plugin, id);
    }
    for file in &movie.files {
        for episode in file.episodes() {
            if let Some(title) = file.episode_titles.get(&episode) {
                println!("  s{:02}e{:02}: {}", file.season, episode, title);
            }
        }
    }
    println!();
}

fn print_person(person: &Person) {
    println!(
        "{}",
        person
            .name
            .if_supports_color(Stdout, |n| n.bold().to_string())
    );
    if let Some(birthday) = &person.birthday {
        println!("  born: {}", birthday);
    }
    if let Some(biography) = &person.biography {
        println!("  {}", biography);
    }
    if !person.filmography.is_empty() {
        let titles: Vec<&str> = person
            .filmography
            .iter()
            .map(|entry| entry.title.as_str())
            .collect();
        println!("  known for: {}", titles.join(", "));
    }
    for (plugin, id) in person.ids() {
        println!("  id[{}]: {}", plugin, id);
    }
    println!();
}

fn run_plugins(settings: &Settings) {
    let registry = PluginRegistry::builtin();
    println!("registered plugins:");
    for name in registry.names() {
        println!("  {}", name);
    }
    println!();

    let plugins = resolve_plugins(settings);
    println!("configured selection:");
    for media_type in MediaType::scannable() {
        let plugin = plugins.plugin_for(*media_type);
        println!(
            "  {:7} {} ({})",
            format!("{}:", media_type.key()),
            plugin.id(),
            plugin.host()
        );
    }
}

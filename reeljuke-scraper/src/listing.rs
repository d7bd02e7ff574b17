//! CSV listing export for scanned records.

use std::path::Path;

use reeljuke_core::Movie;

use crate::error::ScrapeError;

const HEADER: &[&str] = &[
    "type",
    "title",
    "original_title",
    "year",
    "rating",
    "genres",
    "directors",
    "cast",
    "country",
    "runtime",
    "certification",
    "plot",
    "ids",
];

/// Write one row per movie to a CSV listing at `path`.
pub fn write_listing(path: &Path, movies: &[Movie]) -> Result<(), ScrapeError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for movie in movies {
        let rating = movie.rating.map(|r| r.to_string()).unwrap_or_default();
        let genres = movie.genres.join("|");
        let directors = movie.directors.join("|");
        let cast = movie.cast.join("|");
        let ids = joined_ids(movie);
        writer.write_record([
            movie.media_type().key(),
            movie.title.as_str(),
            movie.original_title.as_deref().unwrap_or(""),
            movie.year.as_deref().unwrap_or(""),
            rating.as_str(),
            genres.as_str(),
            directors.as_str(),
            cast.as_str(),
            movie.country.as_deref().unwrap_or(""),
            movie.runtime.as_deref().unwrap_or(""),
            movie.certification.as_deref().unwrap_or(""),
            movie.plot.as_deref().unwrap_or(""),
            ids.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// External ids as `plugin=id` pairs in a stable order.
fn joined_ids(movie: &Movie) -> String {
    let mut pairs: Vec<String> = movie
        .ids()
        .iter()
        .map(|(plugin, id)| format!("{}={}", plugin, id))
        .collect();
    pairs.sort_unstable();
    pairs.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.csv");

        let mut movie = Movie::new("Heat").with_year("1995");
        movie.rating = Some(82);
        movie.add_genre("Crime");
        movie.add_genre("Thriller");
        movie.add_director("Michael Mann");
        movie.set_id("imdb", "tt0113277");
        movie.set_id("moviemeter", "17");

        write_listing(&path, &[movie]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().next(),
            Some("type")
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "movie");
        assert_eq!(&rows[0][1], "Heat");
        assert_eq!(&rows[0][3], "1995");
        assert_eq!(&rows[0][4], "82");
        assert_eq!(&rows[0][5], "Crime|Thriller");
        assert_eq!(&rows[0][12], "imdb=tt0113277;moviemeter=17");
    }

    #[test]
    fn empty_fields_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.csv");

        write_listing(&path, &[Movie::new("Bare")]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][1], "Bare");
        assert_eq!(&rows[0][3], "");
        assert_eq!(&rows[0][12], "");
    }
}

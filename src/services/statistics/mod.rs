//! Viewing-statistics aggregation over a user's watch history.
//!
//! The engine is a pure function of its two inputs. All working state is
//! allocated per call, so concurrent calls never share anything.

use std::collections::{BTreeSet, HashMap};

use crate::models::{MovieMetadata, StatisticsReport, WatchEntry};

mod tally;

pub use tally::{two_decimals, Mean, MeanBy, Tally};

/// Computes the statistics report for one user
///
/// Watch entries without a matching metadata record are left out of every
/// aggregate. Entries for the same movie collapse to the last one, and so do
/// duplicate metadata records.
pub fn compute_statistics(
    watch_history: &[WatchEntry],
    metadata_batch: &[MovieMetadata],
) -> StatisticsReport {
    let joined = join(watch_history, metadata_batch);

    let mut genres = Tally::new();
    let mut languages = Tally::new();
    let mut years = Tally::new();
    let mut countries: BTreeSet<&str> = BTreeSet::new();
    let mut overall = Mean::default();
    let mut by_year = MeanBy::new();
    let mut by_genre = MeanBy::new();
    let mut runtime_hours = 0.0;

    for (entry, movie) in &joined {
        for genre in &movie.genres {
            genres.add(genre.clone());
        }
        for language in &movie.spoken_languages {
            languages.add(language.clone());
        }
        countries.extend(movie.production_countries.iter().map(String::as_str));
        if let Some(year) = movie.release_year {
            years.add(year);
        }
        runtime_hours += movie.runtime_minutes / 60.0;

        let Some(rating) = entry.rated_value() else {
            continue;
        };
        overall.push(rating);
        if let Some(year) = movie.release_year {
            by_year.push(year, rating);
        }
        for genre in &movie.genres {
            by_genre.push(genre.clone(), rating);
        }
    }

    if let Some((start, end)) = year_range(&joined) {
        for year in start..=end {
            years.ensure(year);
            by_year.ensure(year);
        }
    }

    StatisticsReport {
        total_films: joined.len() as u64,
        total_hours: runtime_hours.floor() as u64,
        average_rating: overall.render(),
        ratings_by_year: by_year.into_rendered(),
        ratings_by_genre: by_genre.into_rendered(),
        country_count: countries.len() as u64,
        language_counts: languages.into_counts(),
        genre_counts: genres.into_counts(),
        year_counts: years.into_counts(),
    }
}

/// Pairs each distinct watched movie with its metadata
fn join<'a>(
    watch_history: &'a [WatchEntry],
    metadata_batch: &'a [MovieMetadata],
) -> Vec<(&'a WatchEntry, &'a MovieMetadata)> {
    let metadata: HashMap<&str, &MovieMetadata> = metadata_batch
        .iter()
        .map(|movie| (movie.id.as_str(), movie))
        .collect();

    let latest: HashMap<&str, &WatchEntry> = watch_history
        .iter()
        .map(|entry| (entry.movie_id.as_str(), entry))
        .collect();

    latest
        .into_iter()
        .filter_map(|(movie_id, entry)| metadata.get(movie_id).map(|movie| (entry, *movie)))
        .collect()
}

/// Oldest and newest release year among the joined movies
fn year_range(joined: &[(&WatchEntry, &MovieMetadata)]) -> Option<(i32, i32)> {
    let mut years = joined.iter().filter_map(|(_, movie)| movie.release_year);
    let first = years.next()?;
    Some(years.fold((first, first), |(start, end), year| {
        (start.min(year), end.max(year))
    }))
}

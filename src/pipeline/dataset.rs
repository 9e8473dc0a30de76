use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::similarity::RatingVector;

/// Genre column value MovieLens uses for movies without genres
const NO_GENRES_SENTINEL: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: u32,
    #[serde(rename = "movieId")]
    movie_id: i32,
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: i32,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(rename = "movieId")]
    movie_id: i32,
    tag: String,
}

/// Reads `ratings.csv` into sparse per-movie rating vectors
///
/// Users who did not rate a movie are absent from its vector, which the
/// metrics treat as a rating of 0.
pub fn read_rating_vectors(path: &Path) -> Result<BTreeMap<i32, RatingVector>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open ratings file {}", path.display()))?;

    let mut vectors: BTreeMap<i32, RatingVector> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: RatingRow = row.context("failed to parse rating row")?;
        vectors
            .entry(row.movie_id)
            .or_default()
            .insert(row.user_id, row.rating);
    }
    Ok(vectors)
}

/// Reads `movies.csv` into per-movie genre sets
///
/// Genres come `|`-separated; the `(no genres listed)` sentinel maps to an
/// empty set.
pub fn read_genre_sets(path: &Path) -> Result<BTreeMap<i32, BTreeSet<String>>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open movies file {}", path.display()))?;

    let mut sets = BTreeMap::new();
    for row in reader.deserialize() {
        let row: MovieRow = row.context("failed to parse movie row")?;
        let genres = if row.genres == NO_GENRES_SENTINEL {
            BTreeSet::new()
        } else {
            row.genres
                .split('|')
                .filter(|genre| !genre.is_empty())
                .map(str::to_string)
                .collect()
        };
        sets.insert(row.movie_id, genres);
    }
    Ok(sets)
}

/// Reads `tags.csv` into per-movie tag sets, deduplicating repeated tags
pub fn read_tag_sets(path: &Path) -> Result<BTreeMap<i32, BTreeSet<String>>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open tags file {}", path.display()))?;

    let mut sets: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: TagRow = row.context("failed to parse tag row")?;
        sets.entry(row.movie_id).or_default().insert(row.tag);
    }
    Ok(sets)
}

/// One per-movie JSON record from the content dataset
///
/// Records are keyed by MovieLens id (the file name) and hold up to three
/// sections from different sources. Every field is optional; which source
/// wins for which column is the import assembler's concern.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieRecord {
    pub movielens: Option<MovielensEntry>,
    pub tmdb: Option<TmdbEntry>,
    pub imdb: Option<ImdbEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovielensEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub plot_summary: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub mpaa: Option<String>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub youtube_trailer_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbEntry {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<i32>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub keywords: Vec<TmdbKeyword>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImdbEntry {
    #[serde(default)]
    pub genres: Vec<String>,
}

impl MovieRecord {
    /// Description text, preferring the MovieLens plot summary
    pub fn description(&self) -> Option<&str> {
        self.movielens
            .as_ref()
            .and_then(|ml| ml.plot_summary.as_deref())
            .or_else(|| self.tmdb.as_ref().and_then(|tmdb| tmdb.overview.as_deref()))
            .filter(|text| !text.trim().is_empty())
    }

    /// Genre names from the record, TMDB first, then IMDB
    pub fn genres(&self) -> BTreeSet<String> {
        if let Some(tmdb) = &self.tmdb {
            if !tmdb.genres.is_empty() {
                return tmdb.genres.iter().map(|genre| genre.name.clone()).collect();
            }
        }
        self.imdb
            .as_ref()
            .map(|imdb| imdb.genres.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// TMDB keyword names, the record-side stand-in for user tags
    pub fn keywords(&self) -> BTreeSet<String> {
        self.tmdb
            .as_ref()
            .map(|tmdb| tmdb.keywords.iter().map(|keyword| keyword.name.clone()).collect())
            .unwrap_or_default()
    }
}

/// Lists the `<id>.json` record files in a directory, ascending by id
///
/// Files whose stem is not an integer are skipped.
pub fn record_files(dir: &Path) -> Result<Vec<(i32, PathBuf)>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read records directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i32>().ok())
        else {
            continue;
        };
        files.push((id, path));
    }
    files.sort_by_key(|(id, _)| *id);
    Ok(files)
}

/// Parses one JSON record file
pub fn read_record(path: &Path) -> Result<MovieRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read record {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid record {}", path.display()))
}

/// Reads every record file in a directory into an id-ordered map
pub fn read_records(dir: &Path) -> Result<BTreeMap<i32, MovieRecord>> {
    let mut records = BTreeMap::new();
    for (id, path) in record_files(dir)? {
        records.insert(id, read_record(&path)?);
    }
    Ok(records)
}

/// Genre sets for every movie, falling back to record genres where the CSV
/// has none
pub fn merged_genres(
    csv_sets: &BTreeMap<i32, BTreeSet<String>>,
    records: &BTreeMap<i32, MovieRecord>,
) -> BTreeMap<i32, BTreeSet<String>> {
    let mut merged = csv_sets.clone();
    for (&id, record) in records {
        let missing = merged.get(&id).map_or(true, BTreeSet::is_empty);
        if missing {
            let genres = record.genres();
            if !genres.is_empty() {
                merged.insert(id, genres);
            }
        }
    }
    merged
}

/// Tag sets for every movie, falling back to TMDB keywords where no user
/// tagged the movie
pub fn merged_tags(
    csv_sets: &BTreeMap<i32, BTreeSet<String>>,
    records: &BTreeMap<i32, MovieRecord>,
) -> BTreeMap<i32, BTreeSet<String>> {
    let mut merged = csv_sets.clone();
    for (&id, record) in records {
        let missing = merged.get(&id).map_or(true, BTreeSet::is_empty);
        if missing {
            let keywords = record.keywords();
            if !keywords.is_empty() {
                merged.insert(id, keywords);
            }
        }
    }
    merged
}

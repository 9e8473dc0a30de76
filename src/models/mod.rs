use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Release date stored for movies whose records carry no usable date
pub const DEFAULT_RELEASE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => unreachable!(),
};

/// MPAA certificate stored for movies without one
pub const UNRATED_MPAA: &str = "-";

/// Similarity metric behind one precomputed neighbor list
///
/// The variant names are the canonical keys: the neighbor CSV written by the
/// generator, the JSON key inside the `recommendations` column and the key in
/// API responses are all derived from [`Metric::key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine similarity over description bag-of-words vectors
    CosineDescriptions,
    /// Cosine similarity over user rating vectors
    CosineRatings,
    /// Jaccard similarity over genre sets
    JaccardGenres,
    /// Jaccard similarity over user tag sets
    JaccardTags,
    /// Manhattan distance over user rating vectors (lower is closer)
    Manhattan,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::CosineDescriptions,
        Metric::CosineRatings,
        Metric::JaccardGenres,
        Metric::JaccardTags,
        Metric::Manhattan,
    ];

    /// Canonical snake_case key for this metric
    pub fn key(self) -> &'static str {
        match self {
            Metric::CosineDescriptions => "cosine_descriptions",
            Metric::CosineRatings => "cosine_ratings",
            Metric::JaccardGenres => "jaccard_genres",
            Metric::JaccardTags => "jaccard_tags",
            Metric::Manhattan => "manhattan",
        }
    }

    /// File name of the neighbor CSV holding this metric's lists
    pub fn file_name(self) -> String {
        format!("{}.csv", self.key())
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-source average scores for a movie
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    /// TMDB vote average (0 when the record has no TMDB section)
    #[serde(default)]
    pub tmdb: f64,
    /// MovieLens average rating (0 when missing)
    #[serde(default)]
    pub movielens: f64,
}

/// Precomputed neighbor id lists, one per metric, plus the raw TMDB list
///
/// Every field defaults to an empty array so rows written before a metric
/// existed still deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// TMDB's own recommendation ids, carried over verbatim from the source
    /// record. These are TMDB ids, not MovieLens ids, and are never hydrated.
    #[serde(default)]
    pub tmdb: Vec<i32>,
    #[serde(default)]
    pub cosine_descriptions: Vec<i32>,
    #[serde(default)]
    pub cosine_ratings: Vec<i32>,
    #[serde(default)]
    pub jaccard_genres: Vec<i32>,
    #[serde(default)]
    pub jaccard_tags: Vec<i32>,
    #[serde(default)]
    pub manhattan: Vec<i32>,
}

impl Recommendations {
    /// Neighbor ids stored for one metric, in rank order
    pub fn for_metric(&self, metric: Metric) -> &[i32] {
        match metric {
            Metric::CosineDescriptions => &self.cosine_descriptions,
            Metric::CosineRatings => &self.cosine_ratings,
            Metric::JaccardGenres => &self.jaccard_genres,
            Metric::JaccardTags => &self.jaccard_tags,
            Metric::Manhattan => &self.manhattan,
        }
    }

    /// Replaces the neighbor list stored for one metric
    pub fn set_metric(&mut self, metric: Metric, ids: Vec<i32>) {
        match metric {
            Metric::CosineDescriptions => self.cosine_descriptions = ids,
            Metric::CosineRatings => self.cosine_ratings = ids,
            Metric::JaccardGenres => self.jaccard_genres = ids,
            Metric::JaccardTags => self.jaccard_tags = ids,
            Metric::Manhattan => self.manhattan = ids,
        }
    }
}

/// One row of the movie catalog
///
/// Rows are created once by the import tool and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// MovieLens id, the primary key
    pub id: i32,
    /// TMDB id when the source record has one
    pub tmdb_id: Option<i32>,
    pub title: String,
    /// Plot summary / overview
    pub description: Option<String>,
    pub release_date: NaiveDate,
    /// Runtime in minutes (0 when missing)
    pub duration: i32,
    /// MPAA certificate, `-` when unrated
    pub mpaa: String,
    /// Actor names
    pub actors: Vec<String>,
    /// YouTube watch URL of the first trailer
    pub trailer_url: Option<String>,
    pub ratings: Ratings,
    pub recommendations: Recommendations,
}

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Metric, Movie, Ratings, Recommendations, DEFAULT_RELEASE_DATE, UNRATED_MPAA};
use crate::pipeline::dataset::MovieRecord;

/// Neighbor lists per metric, as read back from the generator's CSVs
pub type MetricNeighbors = HashMap<Metric, HashMap<i32, Vec<i32>>>;

/// Position of a certificate on the restrictiveness ladder G < M < R < X
///
/// Anything else (including the `-` placeholder) is unknown and never
/// takes part in filtering.
fn mpaa_rank(certificate: &str) -> Option<u8> {
    match certificate {
        "G" => Some(1),
        "M" => Some(2),
        "R" => Some(3),
        "X" => Some(4),
        _ => None,
    }
}

/// Drops neighbors rated more restrictively than the source movie
///
/// A movie certified `M` keeps `G` and `M` neighbors but loses `R` and `X`
/// ones. Neighbors with unknown certificates are kept, as is everything
/// when the source movie's own certificate is unknown.
pub fn mpaa_gate(
    source_certificate: &str,
    mut neighbor_ids: Vec<i32>,
    certificates: &HashMap<i32, String>,
) -> Vec<i32> {
    let Some(source_rank) = mpaa_rank(source_certificate) else {
        return neighbor_ids;
    };
    neighbor_ids.retain(|id| {
        match certificates.get(id).and_then(|cert| mpaa_rank(cert)) {
            Some(neighbor_rank) => neighbor_rank <= source_rank,
            None => true,
        }
    });
    neighbor_ids
}

/// Collects each movie's MPAA certificate for the gate's lookups
pub fn collect_certificates(records: &BTreeMap<i32, MovieRecord>) -> HashMap<i32, String> {
    records
        .iter()
        .filter_map(|(&id, record)| {
            record
                .movielens
                .as_ref()
                .and_then(|ml| ml.mpaa.clone())
                .map(|mpaa| (id, mpaa))
        })
        .collect()
}

/// Parses a record's release date, tolerating timestamps and junk
///
/// Dates arrive as `YYYY-MM-DD` or as a full timestamp whose first ten
/// characters are the date. Missing or unparseable values fall back to
/// 1970-01-01.
pub fn parse_release_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(|value| {
        let date = value.trim();
        let date = date.get(..10).unwrap_or(date);
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    })
    .unwrap_or(DEFAULT_RELEASE_DATE)
}

/// Watch URL for the first YouTube trailer id, if any
pub fn trailer_url(trailer_ids: &[String]) -> Option<String> {
    trailer_ids
        .first()
        .map(|id| format!("https://www.youtube.com/watch?v={}", id))
}

/// Builds one catalog row from a record and the precomputed neighbor lists
///
/// Returns `None` for records without a `movielens` section; those movies
/// are not imported. MovieLens fields win over TMDB ones wherever both
/// exist. A movie absent from a metric's neighbor file gets an empty list
/// for that metric and a log line, never an error.
pub fn assemble_movie(
    id: i32,
    record: &MovieRecord,
    neighbors: &MetricNeighbors,
    certificates: &HashMap<i32, String>,
) -> Option<Movie> {
    let movielens = record.movielens.as_ref()?;
    let tmdb = record.tmdb.as_ref();

    let title = movielens
        .title
        .clone()
        .or_else(|| tmdb.and_then(|t| t.original_title.clone()))
        .unwrap_or_default();

    let description = movielens
        .plot_summary
        .clone()
        .or_else(|| tmdb.and_then(|t| t.overview.clone()));

    let release_date = parse_release_date(
        movielens
            .release_date
            .as_deref()
            .or_else(|| tmdb.and_then(|t| t.release_date.as_deref())),
    );

    let actors = if movielens.actors.is_empty() {
        tmdb.and_then(|t| t.credits.as_ref())
            .map(|credits| credits.cast.iter().map(|member| member.name.clone()).collect())
            .unwrap_or_default()
    } else {
        movielens.actors.clone()
    };

    let mpaa = movielens
        .mpaa
        .clone()
        .unwrap_or_else(|| UNRATED_MPAA.to_string());

    let mut recommendations = Recommendations {
        tmdb: tmdb.map(|t| t.recommendations.clone()).unwrap_or_default(),
        ..Recommendations::default()
    };
    for metric in Metric::ALL {
        let list = neighbors.get(&metric).and_then(|lists| lists.get(&id));
        match list {
            Some(ids) => {
                recommendations.set_metric(metric, mpaa_gate(&mpaa, ids.clone(), certificates));
            }
            None => {
                tracing::warn!(movie_id = id, metric = %metric, "no similarities for movie");
            }
        }
    }

    Some(Movie {
        id,
        tmdb_id: tmdb.and_then(|t| t.id),
        title,
        description,
        release_date,
        duration: movielens.runtime.unwrap_or(0),
        mpaa,
        actors,
        trailer_url: trailer_url(&movielens.youtube_trailer_ids),
        ratings: Ratings {
            tmdb: tmdb.and_then(|t| t.vote_average).unwrap_or(0.0),
            movielens: movielens.avg_rating.unwrap_or(0.0),
        },
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> MovieRecord {
        serde_json::from_str(json).unwrap()
    }

    fn full_record() -> MovieRecord {
        record(
            r#"{
                "movielens": {
                    "title": "Toy Story",
                    "plotSummary": "Toys come alive",
                    "releaseDate": "1995-11-22",
                    "actors": ["Tom Hanks", "Tim Allen"],
                    "mpaa": "G",
                    "avgRating": 3.9,
                    "runtime": 81,
                    "youtubeTrailerIds": ["abc123", "def456"]
                },
                "tmdb": {
                    "id": 862,
                    "original_title": "Toy Story (TMDB)",
                    "overview": "Led by Woody",
                    "release_date": "1995-10-30",
                    "vote_average": 7.9,
                    "recommendations": [863, 9487]
                }
            }"#,
        )
    }

    #[test]
    fn test_assemble_prefers_movielens_fields() {
        let movie = assemble_movie(1, &full_record(), &MetricNeighbors::new(), &HashMap::new())
            .unwrap();
        assert_eq!(movie.title, "Toy Story");
        assert_eq!(movie.description.as_deref(), Some("Toys come alive"));
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(1995, 11, 22).unwrap());
        assert_eq!(movie.tmdb_id, Some(862));
        assert_eq!(movie.ratings.tmdb, 7.9);
        assert_eq!(movie.ratings.movielens, 3.9);
        assert_eq!(movie.duration, 81);
        assert_eq!(movie.actors, vec!["Tom Hanks", "Tim Allen"]);
        assert_eq!(
            movie.trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(movie.recommendations.tmdb, vec![863, 9487]);
    }

    #[test]
    fn test_assemble_skips_records_without_movielens_section() {
        let orphan = record(r#"{"tmdb": {"original_title": "No MovieLens"}}"#);
        assert!(assemble_movie(1, &orphan, &MetricNeighbors::new(), &HashMap::new()).is_none());
    }

    #[test]
    fn test_assemble_defaults_for_sparse_records() {
        let sparse = record(r#"{"movielens": {"title": "Bare"}}"#);
        let movie =
            assemble_movie(7, &sparse, &MetricNeighbors::new(), &HashMap::new()).unwrap();
        assert_eq!(movie.release_date, DEFAULT_RELEASE_DATE);
        assert_eq!(movie.duration, 0);
        assert_eq!(movie.mpaa, UNRATED_MPAA);
        assert!(movie.actors.is_empty());
        assert_eq!(movie.trailer_url, None);
        assert_eq!(movie.ratings.movielens, 0.0);
        assert!(movie.recommendations.tmdb.is_empty());
    }

    #[test]
    fn test_assemble_takes_cast_names_when_movielens_actors_missing() {
        let cast_only = record(
            r#"{
                "movielens": {"title": "Cast"},
                "tmdb": {"credits": {"cast": [{"name": "Keanu Reeves"}, {"name": "Carrie-Anne Moss"}]}}
            }"#,
        );
        let movie =
            assemble_movie(3, &cast_only, &MetricNeighbors::new(), &HashMap::new()).unwrap();
        assert_eq!(movie.actors, vec!["Keanu Reeves", "Carrie-Anne Moss"]);
    }

    #[test]
    fn test_assemble_attaches_gated_neighbor_lists() {
        let mut neighbors = MetricNeighbors::new();
        let mut manhattan = HashMap::new();
        manhattan.insert(1, vec![2, 3, 4]);
        neighbors.insert(Metric::Manhattan, manhattan);

        let mut certificates = HashMap::new();
        certificates.insert(1, "G".to_string());
        certificates.insert(2, "G".to_string());
        certificates.insert(3, "X".to_string());

        let movie = assemble_movie(1, &full_record(), &neighbors, &certificates).unwrap();
        // 3 is rated X, stricter than the movie's G; 4 has no certificate.
        assert_eq!(movie.recommendations.manhattan, vec![2, 4]);
        // Metrics without a file entry stay empty.
        assert!(movie.recommendations.cosine_ratings.is_empty());
    }

    #[test]
    fn test_mpaa_gate_drops_more_restrictive_neighbors() {
        let mut certificates = HashMap::new();
        certificates.insert(1, "G".to_string());
        certificates.insert(2, "M".to_string());
        certificates.insert(3, "R".to_string());
        certificates.insert(4, "X".to_string());

        assert_eq!(mpaa_gate("M", vec![1, 2, 3, 4], &certificates), vec![1, 2]);
        assert_eq!(mpaa_gate("X", vec![1, 2, 3, 4], &certificates), vec![1, 2, 3, 4]);
        assert_eq!(mpaa_gate("G", vec![2, 3], &certificates), Vec::<i32>::new());
    }

    #[test]
    fn test_mpaa_gate_never_filters_unknown_certificates() {
        let mut certificates = HashMap::new();
        certificates.insert(2, "X".to_string());
        certificates.insert(3, "-".to_string());

        // Unknown source certificate: everything passes.
        assert_eq!(mpaa_gate("-", vec![2, 3], &certificates), vec![2, 3]);
        // Unknown or unrated neighbors pass; 2 is known and stricter.
        assert_eq!(mpaa_gate("G", vec![2, 3, 9], &certificates), vec![3, 9]);
    }

    #[test]
    fn test_parse_release_date_variants() {
        assert_eq!(
            parse_release_date(Some("1999-03-31")),
            NaiveDate::from_ymd_opt(1999, 3, 31).unwrap()
        );
        assert_eq!(
            parse_release_date(Some("1999-03-31T00:00:00Z")),
            NaiveDate::from_ymd_opt(1999, 3, 31).unwrap()
        );
        assert_eq!(parse_release_date(Some("")), DEFAULT_RELEASE_DATE);
        assert_eq!(parse_release_date(Some("soon")), DEFAULT_RELEASE_DATE);
        assert_eq!(parse_release_date(None), DEFAULT_RELEASE_DATE);
    }

    #[test]
    fn test_trailer_url_uses_first_id() {
        assert_eq!(
            trailer_url(&["abc".to_string(), "def".to_string()]).as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert_eq!(trailer_url(&[]), None);
    }

    #[test]
    fn test_collect_certificates_skips_movies_without_one() {
        let mut records = BTreeMap::new();
        records.insert(1, record(r#"{"movielens": {"mpaa": "R"}}"#));
        records.insert(2, record(r#"{"movielens": {"title": "Unrated"}}"#));
        records.insert(3, record(r#"{"tmdb": {}}"#));

        let certificates = collect_certificates(&records);
        assert_eq!(certificates.get(&1).map(String::as_str), Some("R"));
        assert_eq!(certificates.get(&2), None);
        assert_eq!(certificates.get(&3), None);
    }
}

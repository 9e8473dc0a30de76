use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::{Movie, Ratings, Recommendations};

/// Read and bulk-write access to the movie catalog
///
/// The server only uses the read side; `import-movies` owns the write side.
/// Handlers hold the store as a trait object so tests can swap in a scripted
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetches one movie by id
    async fn movie(&self, id: i32) -> AppResult<Option<Movie>>;

    /// Case-insensitive substring search over titles
    ///
    /// Results are ordered by title descending. An empty needle matches
    /// every movie.
    async fn search(&self, title: &str, limit: i64, offset: i64) -> AppResult<Vec<Movie>>;

    /// Fetches the given ids, preserving their order
    ///
    /// Ids absent from the catalog are skipped, not errors; neighbor lists
    /// may reference movies that were never imported.
    async fn movies_ordered(&self, ids: &[i32]) -> AppResult<Vec<Movie>>;

    /// Inserts rows in chunks inside a single transaction
    ///
    /// Rows whose id already exists are left untouched, so re-running the
    /// importer is safe. Returns the number of rows actually inserted.
    async fn insert_batch(&self, movies: &[Movie], chunk_size: usize) -> AppResult<u64>;
}

/// Escapes LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Reorders fetched movies to match the requested id order
fn order_by_ids(movies: Vec<Movie>, ids: &[i32]) -> Vec<Movie> {
    let mut by_id: HashMap<i32, Movie> =
        movies.into_iter().map(|movie| (movie.id, movie)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// Database representation of a catalog row
///
/// The JSONB columns come back wrapped; `From` unwraps them into the domain
/// type.
#[derive(sqlx::FromRow)]
struct MovieRow {
    id: i32,
    tmdb_id: Option<i32>,
    title: String,
    description: Option<String>,
    release_date: chrono::NaiveDate,
    duration: i32,
    mpaa: String,
    actors: Json<Vec<String>>,
    trailer_url: Option<String>,
    ratings: Json<Ratings>,
    recommendations: Json<Recommendations>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            tmdb_id: row.tmdb_id,
            title: row.title,
            description: row.description,
            release_date: row.release_date,
            duration: row.duration,
            mpaa: row.mpaa,
            actors: row.actors.0,
            trailer_url: row.trailer_url,
            ratings: row.ratings.0,
            recommendations: row.recommendations.0,
        }
    }
}

const MOVIE_COLUMNS: &str = "id, tmdb_id, title, description, release_date, duration, mpaa, \
                             actors, trailer_url, ratings, recommendations";

/// Postgres-backed [`MovieStore`]
#[derive(Clone)]
pub struct PgMovieStore {
    pool: PgPool,
}

impl PgMovieStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn movie(&self, id: i32) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movie_infos WHERE id = $1");
        let row = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Movie::from))
    }

    async fn search(&self, title: &str, limit: i64, offset: i64) -> AppResult<Vec<Movie>> {
        let pattern = format!("%{}%", escape_like(title));
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movie_infos \
             WHERE title ILIKE $1 ORDER BY title DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn movies_ordered(&self, ids: &[i32]) -> AppResult<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movie_infos WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let movies = rows.into_iter().map(Movie::from).collect();
        Ok(order_by_ids(movies, ids))
    }

    async fn insert_batch(&self, movies: &[Movie], chunk_size: usize) -> AppResult<u64> {
        let chunk_size = chunk_size.max(1);
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in movies.chunks(chunk_size) {
            let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
                "INSERT INTO movie_infos (id, tmdb_id, title, description, release_date, \
                 duration, mpaa, actors, trailer_url, ratings, recommendations) ",
            );
            builder.push_values(chunk, |mut row, movie| {
                row.push_bind(movie.id)
                    .push_bind(movie.tmdb_id)
                    .push_bind(&movie.title)
                    .push_bind(&movie.description)
                    .push_bind(movie.release_date)
                    .push_bind(movie.duration)
                    .push_bind(&movie.mpaa)
                    .push_bind(Json(&movie.actors))
                    .push_bind(&movie.trailer_url)
                    .push_bind(Json(&movie.ratings))
                    .push_bind(Json(&movie.recommendations));
            });
            builder.push(" ON CONFLICT (id) DO NOTHING");

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::cached;
use crate::db::CacheKey;
use crate::error::{AppError, AppResult};
use crate::models::Movie;
use crate::routes::AppState;

/// Seconds a search response stays cached
const SEARCH_TTL: u64 = 300;
/// Seconds a movie detail stays cached
const MOVIE_TTL: u64 = 3600;

const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub title: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Movie as served by the API: the catalog row plus its poster path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePayload {
    #[serde(flatten)]
    pub movie: Movie,
    /// Relative poster path, resolved by the front end against its asset host
    pub poster: String,
}

impl From<Movie> for MoviePayload {
    fn from(movie: Movie) -> Self {
        let poster = format!("posters/{}.jpg", movie.id);
        Self { movie, poster }
    }
}

/// Handler for title search
///
/// A blank or absent `title` lists the whole catalog, still ordered by title
/// descending.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<MoviePayload>>> {
    let title = params.title.unwrap_or_default();
    let limit = i64::from(params.limit.unwrap_or(DEFAULT_LIMIT));
    let offset = i64::from(params.offset.unwrap_or(0));

    let key = CacheKey::MovieSearch {
        title: title.clone(),
        limit,
        offset,
    };
    let movies = cached!(state.cache, key, SEARCH_TTL, async {
        let movies = state.store.search(&title, limit, offset).await?;
        Ok::<_, AppError>(
            movies
                .into_iter()
                .map(MoviePayload::from)
                .collect::<Vec<_>>(),
        )
    })?;

    Ok(Json(movies))
}

/// Handler for the movie detail view
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MoviePayload>> {
    let movie = cached!(state.cache, CacheKey::Movie(id), MOVIE_TTL, async {
        let movie = state
            .store
            .movie(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("movie {} not found", id)))?;
        Ok::<_, AppError>(MoviePayload::from(movie))
    })?;

    Ok(Json(movie))
}

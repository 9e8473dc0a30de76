use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cached;
use crate::db::CacheKey;
use crate::error::{AppError, AppResult};
use crate::models::Metric;
use crate::routes::movies::MoviePayload;
use crate::routes::AppState;

/// Seconds a recommendations response stays cached
const RECOMMENDATIONS_TTL: u64 = 600;

const DEFAULT_COUNT: usize = 5;
const MAX_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub count: Option<usize>,
}

/// Movie plus its neighbor lists, hydrated into full payloads per metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsPayload {
    pub movie: MoviePayload,
    pub recommendations: BTreeMap<Metric, Vec<MoviePayload>>,
}

/// Handler for the recommendations view
///
/// For each metric, the stored neighbor list is cut to `count` ids and
/// hydrated from the store in stored rank order. Ids that were never
/// imported simply drop out of the list.
pub async fn recommend(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<RecommendationsPayload>> {
    let count = params.count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_COUNT);

    let key = CacheKey::Recommendations {
        movie_id: id,
        count,
    };
    let payload = cached!(state.cache, key, RECOMMENDATIONS_TTL, async {
        let movie = state
            .store
            .movie(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("movie {} not found", id)))?;

        let mut recommendations = BTreeMap::new();
        for metric in Metric::ALL {
            let stored = movie.recommendations.for_metric(metric);
            let wanted = &stored[..stored.len().min(count)];
            let neighbors = if wanted.is_empty() {
                Vec::new()
            } else {
                state
                    .store
                    .movies_ordered(wanted)
                    .await?
                    .into_iter()
                    .map(MoviePayload::from)
                    .collect()
            };
            recommendations.insert(metric, neighbors);
        }

        Ok::<_, AppError>(RecommendationsPayload {
            movie: MoviePayload::from(movie),
            recommendations,
        })
    })?;

    Ok(Json(payload))
}

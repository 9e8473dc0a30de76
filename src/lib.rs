//! Movie catalog service: a read-only JSON API over a Postgres catalog of
//! movies enriched with precomputed per-metric recommendation lists, plus
//! the offline pipeline (`generate-similarities`, `import-movies`) that
//! builds those lists.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;

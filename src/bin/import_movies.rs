//! Movie Importer
//!
//! One-shot ETL. Reads the per-movie JSON records and the five neighbor CSVs
//! written by `generate-similarities`, assembles catalog rows with the MPAA
//! gate applied and bulk inserts them into Postgres. Re-runs are idempotent;
//! existing rows are left untouched.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marquee_api::config::Config;
use marquee_api::db::{create_pool, run_migrations, MovieStore, PgMovieStore};
use marquee_api::models::Metric;
use marquee_api::pipeline::import::{assemble_movie, collect_certificates, MetricNeighbors};
use marquee_api::pipeline::{dataset, neighbors};

#[derive(Parser, Debug)]
#[command(name = "import-movies")]
#[command(about = "Load assembled movie rows into Postgres")]
struct Args {
    /// Directory of per-movie <id>.json records
    #[arg(long, default_value = "data/records")]
    records_dir: PathBuf,

    /// Directory holding the per-metric neighbor CSVs
    #[arg(long, default_value = "data/similarities")]
    similarities_dir: PathBuf,

    /// Rows per INSERT statement
    #[arg(long, default_value_t = 100)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let mut metric_neighbors = MetricNeighbors::new();
    for metric in Metric::ALL {
        let path = args.similarities_dir.join(metric.file_name());
        let lists = neighbors::read_neighbor_file(&path)?;
        info!(metric = %metric, movies = lists.len(), "neighbor file loaded");
        metric_neighbors.insert(metric, lists);
    }

    let records = dataset::read_records(&args.records_dir)?;
    info!(records = records.len(), "records loaded");

    let certificates = collect_certificates(&records);

    let mut movies = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (&id, record) in &records {
        match assemble_movie(id, record, &metric_neighbors, &certificates) {
            Some(movie) => movies.push(movie),
            None => {
                warn!(movie_id = id, "record has no movielens section, skipping");
                skipped += 1;
            }
        }
    }

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let store = PgMovieStore::new(pool);
    let inserted = store.insert_batch(&movies, args.batch_size).await?;

    info!(
        inserted,
        assembled = movies.len(),
        skipped,
        "import finished"
    );

    Ok(())
}

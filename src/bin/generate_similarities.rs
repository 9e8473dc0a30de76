//! Similarity Generator
//!
//! One-shot batch tool. Reads the MovieLens-style CSVs and the per-movie
//! JSON records, scores every movie pair under five similarity metrics and
//! writes one top-N neighbor CSV per metric for `import-movies` to consume.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use marquee_api::models::Metric;
use marquee_api::pipeline::{dataset, neighbors, similarity};

#[derive(Parser, Debug)]
#[command(name = "generate-similarities")]
#[command(about = "Compute per-metric movie neighbor lists from the dataset")]
struct Args {
    /// Directory holding ratings.csv, movies.csv and tags.csv
    #[arg(long, default_value = "data/dataset")]
    dataset_dir: PathBuf,

    /// Directory of per-movie <id>.json records
    #[arg(long, default_value = "data/records")]
    records_dir: PathBuf,

    /// Directory the neighbor CSVs are written to
    #[arg(long, default_value = "data/similarities")]
    out_dir: PathBuf,

    /// Neighbors kept per movie and metric
    #[arg(long, default_value_t = 10)]
    top_n: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!(dataset = %args.dataset_dir.display(), "loading dataset");
    let rating_vectors = dataset::read_rating_vectors(&args.dataset_dir.join("ratings.csv"))?;
    let genre_sets = dataset::read_genre_sets(&args.dataset_dir.join("movies.csv"))?;
    let tag_sets = dataset::read_tag_sets(&args.dataset_dir.join("tags.csv"))?;
    let records = dataset::read_records(&args.records_dir)?;
    info!(
        rated_movies = rating_vectors.len(),
        records = records.len(),
        "dataset loaded"
    );

    let genres = dataset::merged_genres(&genre_sets, &records);
    let tags = dataset::merged_tags(&tag_sets, &records);
    let descriptions: BTreeMap<i32, String> = records
        .iter()
        .filter_map(|(&id, record)| record.description().map(|text| (id, text.to_string())))
        .collect();

    fs::create_dir_all(&args.out_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.out_dir.display()
        )
    })?;

    let cosine_ratings = similarity::rating_cosine_neighbors(&rating_vectors, args.top_n);
    write_metric(&args.out_dir, Metric::CosineRatings, &cosine_ratings)?;

    let manhattan = similarity::rating_manhattan_neighbors(&rating_vectors, args.top_n);
    write_metric(&args.out_dir, Metric::Manhattan, &manhattan)?;

    let jaccard_genres = similarity::jaccard_neighbors(&genres, args.top_n);
    write_metric(&args.out_dir, Metric::JaccardGenres, &jaccard_genres)?;

    let jaccard_tags = similarity::jaccard_neighbors(&tags, args.top_n);
    write_metric(&args.out_dir, Metric::JaccardTags, &jaccard_tags)?;

    let cosine_descriptions =
        similarity::description_cosine_neighbors(&descriptions, args.top_n);
    write_metric(&args.out_dir, Metric::CosineDescriptions, &cosine_descriptions)?;

    info!(out = %args.out_dir.display(), "all neighbor files written");
    Ok(())
}

fn write_metric(
    out_dir: &Path,
    metric: Metric,
    lists: &BTreeMap<i32, Vec<i32>>,
) -> Result<()> {
    let path = out_dir.join(metric.file_name());
    neighbors::write_neighbor_file(&path, lists)?;
    info!(metric = %metric, movies = lists.len(), "neighbor file written");
    Ok(())
}

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Writes one metric's neighbor lists as headerless CSV
///
/// Row layout is `movie_id,n1,...,nN`. Movies can have fewer than N
/// neighbors, so rows are allowed to differ in length.
pub fn write_neighbor_file(path: &Path, neighbors: &BTreeMap<i32, Vec<i32>>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create neighbor file {}", path.display()))?;

    for (movie_id, ids) in neighbors {
        let mut row = Vec::with_capacity(ids.len() + 1);
        row.push(movie_id.to_string());
        row.extend(ids.iter().map(|id| id.to_string()));
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write neighbor row for movie {}", movie_id))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush neighbor file {}", path.display()))?;
    Ok(())
}

/// Reads one metric's neighbor lists back from CSV
///
/// Every cell must be an integer id; anything else aborts the read.
pub fn read_neighbor_file(path: &Path) -> Result<HashMap<i32, Vec<i32>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open neighbor file {}", path.display()))?;

    let mut neighbors = HashMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read {} line {}", path.display(), line + 1))?;
        let mut cells = record.iter();

        let Some(first) = cells.next() else {
            bail!("{} line {}: empty row", path.display(), line + 1);
        };
        let movie_id: i32 = first.trim().parse().with_context(|| {
            format!("{} line {}: invalid movie id {:?}", path.display(), line + 1, first)
        })?;

        let mut ids = Vec::new();
        for cell in cells {
            let id: i32 = cell.trim().parse().with_context(|| {
                format!("{} line {}: invalid neighbor id {:?}", path.display(), line + 1, cell)
            })?;
            ids.push(id);
        }
        neighbors.insert(movie_id, ids);
    }
    Ok(neighbors)
}

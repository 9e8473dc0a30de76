//! Offline similarity pipeline
//!
//! Two command line tools drive this module. `generate-similarities` reads
//! the MovieLens CSVs and per-movie JSON records, scores every movie pair
//! under each metric and writes one neighbor CSV per metric. `import-movies`
//! reads those CSVs back, joins them with the records and bulk inserts the
//! finished catalog rows.

pub mod dataset;
pub mod import;
pub mod neighbors;
pub mod similarity;
pub mod text;

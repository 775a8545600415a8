//! Startup seeding from a JSON file of items (same shape as `POST /api/items`).

use std::path::Path;

use domain::{CatalogError, CatalogService, CatalogStore};
use tracing::info;

use crate::dto::ItemIn;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("cannot read seed file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("seed file is not a JSON array of items: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("seed item '{id}' rejected: {source}")]
    Item { id: String, source: CatalogError },
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Create every item in `raw`. Items whose id already exists are skipped so
/// a persistent store can be restarted with the same seed.
pub fn seed_from_str<S: CatalogStore>(
    catalog: &CatalogService<S>,
    raw: &str,
) -> Result<SeedReport, SeedError> {
    let items: Vec<ItemIn> = serde_json::from_str(raw)?;
    let mut report = SeedReport::default();
    for input in items {
        let id = input.id.clone();
        let new_item = input
            .into_new_item()
            .map_err(|source| SeedError::Item { id: id.clone(), source })?;
        match catalog.create(new_item) {
            Ok(_) => report.created += 1,
            Err(CatalogError::AlreadyExists) => {
                info!(item_id = %id, "seed item already present, skipping");
                report.skipped += 1;
            }
            Err(source) => return Err(SeedError::Item { id, source }),
        }
    }
    Ok(report)
}

pub fn seed_from_file<S: CatalogStore>(
    catalog: &CatalogService<S>,
    path: &Path,
) -> Result<SeedReport, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.display().to_string(),
        source,
    })?;
    seed_from_str(catalog, &raw)
}

//! Runs the spreadsheet filter off the async executor.
//
// The filter is CPU bound and synchronous, so it goes to the blocking pool.
// Nothing cancels it: if the caller goes away the worker finishes and its
// result is dropped.

use crate::filter::{self, FilterOptions, FilterWindow, FilteredRow};
use anyhow::{anyhow, Result};
use log::{debug, info};
use std::time::Instant;

pub async fn analyze(
    bytes: Vec<u8>,
    window: FilterWindow,
    options: FilterOptions,
) -> Result<Vec<FilteredRow>> {
    info!("Analyzing {} byte upload for window '{}'", bytes.len(), window);
    let started = Instant::now();

    let rows = tokio::task::spawn_blocking(move || filter::filter_rows(&bytes, &window, &options))
        .await
        .map_err(|e| anyhow!("Analysis worker failed: {}", e))??;

    debug!("Analysis finished in {:?} with {} rows", started.elapsed(), rows.len());
    Ok(rows)
}

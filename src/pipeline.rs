pub mod accumulator;
pub mod history;
pub mod normalize;
pub mod sink;
pub mod walker;

use crate::config::{DateCarry, ImportConfig};
use crate::error::Result;
use crate::idempotency::collection_digest;
use crate::storage::Storage;
use crate::types::{cell_at, ImportReport, PersistedAccount, RawGrid};
use accumulator::AccountAccumulator;
use history::append_history;
use metrics::{counter, histogram};
use normalize::{normalize_handle_with_markers, normalize_link, DateTriplet};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use walker::SheetWalker;

/// Accounts derived from a grid, ready to be committed
#[derive(Debug, Clone)]
pub struct Assembled {
    pub accounts: Vec<PersistedAccount>,
    pub report: ImportReport,
}

/// Walk a grid and build every account with its history.
///
/// This is the synchronous part of an import: rows are consumed strictly in
/// sheet order because the category cursor and the forward-filled date both
/// depend on the previous rows.
pub fn assemble(grid: &RawGrid, config: &ImportConfig) -> Result<Assembled> {
    let mut accumulator = AccountAccumulator::new(config.link_merge);
    let mut last_date: Option<DateTriplet> = None;
    let mut current_tab: Option<usize> = None;
    let mut report = ImportReport {
        platform: config.platform.clone(),
        collection: config.collection.clone(),
        tabs: grid.tabs.len(),
        ..ImportReport::default()
    };

    for row in SheetWalker::new(grid, config) {
        if current_tab != Some(row.tab_index) {
            if config.date_carry == DateCarry::ResetPerTab {
                last_date = None;
            }
            current_tab = Some(row.tab_index);
        }
        report.rows_seen += 1;

        if row.is_category_marker {
            debug!(tab = row.tab_index, row = row.row_index, "Entering category {}", row.category);
            report.markers += 1;
            continue;
        }

        let link = normalize_link(cell_at(row.cells, config.link_column));
        let username =
            normalize_handle_with_markers(link.as_deref(), &config.domain, &config.profile_markers);
        let linked = link.is_some();

        let draft = accumulator.observe(row.name, row.category, link, username);

        if !linked {
            debug!(tab = row.tab_index, row = row.row_index, "No valid link for {}", draft.name);
            report.rows_without_link += 1;
            continue;
        }

        last_date = append_history(draft, row.cells, config, last_date);
        report.history_entries += 1;
    }

    let accounts: Vec<PersistedAccount> = accumulator
        .into_drafts()
        .into_iter()
        .map(|draft| PersistedAccount::from_draft(draft, &config.collection))
        .collect();

    report.accounts = accounts.len();
    report.digest = collection_digest(&accounts)?;

    Ok(Assembled { accounts, report })
}

/// Runs full imports of a platform's sheet into a storage backend
pub struct Importer {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("storage", &"<Arc<dyn Storage>>")
            .finish()
    }
}

impl Importer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Rebuild the platform's collection from the current spreadsheet snapshot.
    #[instrument(skip(self, grid, config), fields(platform = %config.platform))]
    pub async fn run(&self, grid: &RawGrid, config: &ImportConfig) -> Result<ImportReport> {
        let started = std::time::Instant::now();
        info!("Starting import of {} tabs into {}", grid.tabs.len(), config.collection);

        let Assembled { accounts, report } = assemble(grid, config)?;
        info!(
            "Assembled {} accounts ({} rows, {} markers, {} without link, {} history entries)",
            report.accounts,
            report.rows_seen,
            report.markers,
            report.rows_without_link,
            report.history_entries
        );

        let platform = config.platform.clone();
        counter!("observatory_rows_imported_total", "platform" => platform.clone())
            .increment(report.history_entries as u64);
        counter!("observatory_rows_skipped_total", "platform" => platform.clone())
            .increment(report.rows_without_link as u64);
        counter!("observatory_category_markers_total", "platform" => platform.clone())
            .increment(report.markers as u64);

        let summary = sink::commit(self.storage.clone(), &config.collection, accounts).await?;

        histogram!("observatory_import_duration_seconds", "platform" => platform)
            .record(started.elapsed().as_secs_f64());
        info!(
            "Import finished: replaced {} accounts with {} (digest {})",
            summary.removed, summary.inserted, report.digest
        );

        Ok(report)
    }
}

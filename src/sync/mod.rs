//! Export/import sessions
//!
//! The host document is single-threaded: every read and write happens on the
//! task that owns it. Workbook I/O runs on a blocking worker thread and talks
//! to the host only through [`HostRequest`] messages, each answered on a
//! oneshot channel. Progress travels the same way.

mod progress;

pub use progress::Progress;

use crate::config::{SyncConfig, TransactionScope};
use crate::core::schedule::extract;
use crate::error::{ErrorKind, ErrorRecord, SyncError, SyncResult};
use crate::excel::{
    apply_row, build_category_grid, plan_categories, plan_schedules, read_workbook, ExcelExporter,
    ExportSource, ImportPlan, ImportReport, RowOutcome, RowUpdate, WriteLog,
};
use crate::host::{HostDocument, Scope};
use serde::Serialize;
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

const TRANSACTION_NAME: &str = "Import from Excel";

/// Request from the worker to the task that owns the host
#[derive(Debug)]
pub enum HostRequest {
    Begin {
        name: String,
        reply: oneshot::Sender<SyncResult<()>>,
    },
    ApplyRow {
        row: RowUpdate,
        reply: oneshot::Sender<RowOutcome>,
    },
    Commit {
        reply: oneshot::Sender<SyncResult<()>>,
    },
    Rollback {
        reply: oneshot::Sender<()>,
    },
    Progress(u8),
}

/// The worker's view of the host
pub trait HostAccess {
    fn begin(&mut self, name: &str) -> SyncResult<()>;
    fn apply_row(&mut self, row: RowUpdate) -> SyncResult<RowOutcome>;
    fn commit(&mut self) -> SyncResult<()>;
    fn rollback(&mut self) -> SyncResult<()>;
    fn progress(&mut self, percent: u8);
}

/// Host access from a blocking worker thread, over the coordinator's channel
pub struct ChannelAccess {
    tx: mpsc::Sender<HostRequest>,
}

impl ChannelAccess {
    pub fn new(tx: mpsc::Sender<HostRequest>) -> Self {
        Self { tx }
    }

    fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> HostRequest) -> SyncResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .blocking_send(make(reply))
            .map_err(|_| SyncError::Worker("coordinator stopped".to_string()))?;
        response
            .blocking_recv()
            .map_err(|_| SyncError::Worker("coordinator dropped the request".to_string()))
    }
}

impl HostAccess for ChannelAccess {
    fn begin(&mut self, name: &str) -> SyncResult<()> {
        let name = name.to_string();
        self.request(|reply| HostRequest::Begin { name, reply })?
    }

    fn apply_row(&mut self, row: RowUpdate) -> SyncResult<RowOutcome> {
        self.request(|reply| HostRequest::ApplyRow { row, reply })
    }

    fn commit(&mut self) -> SyncResult<()> {
        self.request(|reply| HostRequest::Commit { reply })?
    }

    fn rollback(&mut self) -> SyncResult<()> {
        self.request(|reply| HostRequest::Rollback { reply })
    }

    fn progress(&mut self, percent: u8) {
        // Progress is advisory; a closed channel shows up on the next request
        let _ = self.tx.blocking_send(HostRequest::Progress(percent));
    }
}

/// Host access on the host's own thread
pub struct DirectAccess<'a, H: ?Sized, F> {
    host: &'a mut H,
    on_progress: F,
    log: WriteLog,
}

impl<'a, H, F> DirectAccess<'a, H, F>
where
    H: HostDocument + ?Sized,
    F: FnMut(u8),
{
    pub fn new(host: &'a mut H, on_progress: F) -> Self {
        Self {
            host,
            on_progress,
            log: WriteLog::default(),
        }
    }
}

impl<H, F> HostAccess for DirectAccess<'_, H, F>
where
    H: HostDocument + ?Sized,
    F: FnMut(u8),
{
    fn begin(&mut self, name: &str) -> SyncResult<()> {
        self.log.clear();
        self.host
            .begin_transaction(name)
            .map_err(|e| SyncError::HostTransaction(e.to_string()))
    }

    fn apply_row(&mut self, row: RowUpdate) -> SyncResult<RowOutcome> {
        Ok(apply_row(&mut *self.host, &row, &mut self.log))
    }

    fn commit(&mut self) -> SyncResult<()> {
        self.log.clear();
        self.host
            .commit_transaction()
            .map_err(|e| SyncError::HostTransaction(e.to_string()))
    }

    fn rollback(&mut self) -> SyncResult<()> {
        self.log.clear();
        self.host.rollback_transaction();
        Ok(())
    }

    fn progress(&mut self, percent: u8) {
        (self.on_progress)(percent)
    }
}

/// Apply a plan through `access`.
///
/// Per-row failures are collected and the transaction is still committed.
/// Only a failure of the access itself rolls back and aborts.
pub fn run_import<A: HostAccess + ?Sized>(
    access: &mut A,
    plan: ImportPlan,
    scope: TransactionScope,
    progress_batch: usize,
) -> SyncResult<ImportReport> {
    let mut progress = Progress::new(plan.row_count(), progress_batch);
    let mut report = ImportReport {
        sheets: plan.sheets.len(),
        skipped: plan.skipped,
        errors: plan.errors,
        ..ImportReport::default()
    };

    if scope == TransactionScope::Workbook {
        access.begin(TRANSACTION_NAME)?;
    }

    for sheet in plan.sheets {
        if scope == TransactionScope::Sheet {
            access.begin(&format!("{}: {}", TRANSACTION_NAME, sheet.name))?;
        }
        for row in sheet.rows {
            match access.apply_row(row) {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => {
                    let _ = access.rollback();
                    return Err(e);
                }
            }
            if let Some(percent) = progress.tick() {
                access.progress(percent);
            }
        }
        if scope == TransactionScope::Sheet {
            commit_or_rollback(access)?;
        }
    }

    if scope == TransactionScope::Workbook {
        commit_or_rollback(access)?;
    }
    if let Some(percent) = progress.finish() {
        access.progress(percent);
    }

    Ok(report)
}

fn commit_or_rollback<A: HostAccess + ?Sized>(access: &mut A) -> SyncResult<()> {
    access.commit().map_err(|e| {
        let _ = access.rollback();
        e
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExportSummary {
    pub sheets: usize,
    pub rows: usize,
}

/// Runs sessions against a host it owns for their duration
pub struct Coordinator<'h, H: HostDocument + ?Sized> {
    host: &'h mut H,
    config: SyncConfig,
}

impl<'h, H: HostDocument + ?Sized> Coordinator<'h, H> {
    pub fn new(host: &'h mut H, config: SyncConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// One sheet per category. Empty `categories` exports every category.
    pub async fn export_categories(
        &mut self,
        output: &Path,
        categories: &[String],
        attributes: &[String],
        scope: &Scope,
        mut on_progress: impl FnMut(u8),
    ) -> SyncResult<ExportSummary> {
        let categories = if categories.is_empty() {
            self.host.categories()
        } else {
            categories.to_vec()
        };
        let members: Vec<_> = categories
            .iter()
            .map(|c| (c, self.host.entities(c, scope)))
            .collect();
        let total: usize = members.iter().map(|(_, ids)| ids.len()).sum();
        info!(categories = members.len(), elements = total, "exporting categories");

        let mut progress = Progress::new(total, self.config.progress_batch);
        let mut grids = Vec::with_capacity(members.len());
        for (category, ids) in &members {
            let grid = build_category_grid(&*self.host, category, ids, attributes, || {
                if let Some(percent) = progress.tick() {
                    on_progress(percent);
                }
            });
            grids.push(grid);
        }

        let summary = ExportSummary {
            sheets: grids.len(),
            rows: total,
        };
        let path = output.to_path_buf();
        task::spawn_blocking(move || {
            ExcelExporter::new(ExportSource::Categories(grids)).export(&path)
        })
        .await
        .map_err(|e| SyncError::Worker(e.to_string()))??;

        if let Some(percent) = progress.finish() {
            on_progress(percent);
        }
        info!(path = %output.display(), sheets = summary.sheets, "export complete");
        Ok(summary)
    }

    /// One sheet per schedule. Empty `schedules` exports every schedule.
    pub async fn export_schedules(
        &mut self,
        output: &Path,
        schedules: &[String],
        mut on_progress: impl FnMut(u8),
    ) -> SyncResult<ExportSummary> {
        let names = self.schedule_names(schedules);
        let mut progress = Progress::new(names.len(), 1);
        let mut snapshots = Vec::with_capacity(names.len());
        for name in &names {
            snapshots.extend(extract(
                &*self.host,
                std::slice::from_ref(name),
                self.config.include_headers,
                self.config.include_grand_totals,
            ));
            if let Some(percent) = progress.tick() {
                on_progress(percent);
            }
        }

        let summary = ExportSummary {
            sheets: snapshots.len(),
            rows: snapshots.iter().map(|s| s.body.len()).sum(),
        };
        let path = output.to_path_buf();
        task::spawn_blocking(move || {
            ExcelExporter::new(ExportSource::Schedules(snapshots)).export(&path)
        })
        .await
        .map_err(|e| SyncError::Worker(e.to_string()))??;

        if let Some(percent) = progress.finish() {
            on_progress(percent);
        }
        info!(path = %output.display(), sheets = summary.sheets, "schedule export complete");
        Ok(summary)
    }

    /// Import category sheets. Empty filters select everything in the file.
    pub async fn import_categories(
        &mut self,
        input: &Path,
        categories: &[String],
        attributes: &[String],
        mut on_progress: impl FnMut(u8),
    ) -> SyncResult<ImportReport> {
        let path = input.to_path_buf();
        let categories = categories.to_vec();
        let attributes = attributes.to_vec();
        let fallback = self.config.fallback_key_attribute.clone();
        let scope = self.config.transaction_scope;
        let batch = self.config.progress_batch;

        let (tx, rx) = mpsc::channel(64);
        let worker = task::spawn_blocking(move || {
            let contents = read_workbook(&path)?;
            let plan = plan_categories(&contents, &categories, &attributes, &fallback);
            run_import(&mut ChannelAccess::new(tx), plan, scope, batch)
        });

        let report = self.serve(rx, worker, &mut on_progress).await?;
        info!(
            rows = report.rows,
            written = report.written,
            errors = report.errors.len(),
            "import complete"
        );
        Ok(report)
    }

    /// Import schedule sheets against the live schedule definitions
    pub async fn import_schedules(
        &mut self,
        input: &Path,
        schedules: &[String],
        mut on_progress: impl FnMut(u8),
    ) -> SyncResult<ImportReport> {
        let live = self.host.schedules();
        let mut unknown = Vec::new();
        let definitions: Vec<_> = if schedules.is_empty() {
            live
        } else {
            schedules
                .iter()
                .filter_map(|name| {
                    let found = live.iter().find(|d| &d.name == name).cloned();
                    if found.is_none() {
                        warn!(schedule = %name, "schedule not found in document");
                        unknown.push(ErrorRecord::new(
                            ErrorKind::SheetNotFound,
                            name.clone(),
                            "",
                            "no schedule with this name in the document",
                        ));
                    }
                    found
                })
                .collect()
        };

        let path = input.to_path_buf();
        let scope = self.config.transaction_scope;
        let batch = self.config.progress_batch;

        let (tx, rx) = mpsc::channel(64);
        let worker = task::spawn_blocking(move || {
            let contents = read_workbook(&path)?;
            let plan = plan_schedules(&contents, &definitions);
            run_import(&mut ChannelAccess::new(tx), plan, scope, batch)
        });

        let mut report = self.serve(rx, worker, &mut on_progress).await?;
        unknown.append(&mut report.errors);
        report.errors = unknown;
        info!(
            rows = report.rows,
            written = report.written,
            errors = report.errors.len(),
            "schedule import complete"
        );
        Ok(report)
    }

    fn schedule_names(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            self.host.schedules().into_iter().map(|d| d.name).collect()
        } else {
            requested.to_vec()
        }
    }

    /// Answer host requests until the worker drops its sender, then collect
    /// its result. A transaction the worker left open is rolled back.
    async fn serve<T>(
        &mut self,
        mut rx: mpsc::Receiver<HostRequest>,
        worker: JoinHandle<SyncResult<T>>,
        on_progress: &mut impl FnMut(u8),
    ) -> SyncResult<T> {
        let mut open = false;
        let mut log = WriteLog::default();

        while let Some(request) = rx.recv().await {
            match request {
                HostRequest::Begin { name, reply } => {
                    debug!(transaction = %name, "begin");
                    log.clear();
                    let result = self
                        .host
                        .begin_transaction(&name)
                        .map_err(|e| SyncError::HostTransaction(e.to_string()));
                    open = result.is_ok();
                    let _ = reply.send(result);
                }
                HostRequest::ApplyRow { row, reply } => {
                    let _ = reply.send(apply_row(&mut *self.host, &row, &mut log));
                }
                HostRequest::Commit { reply } => {
                    debug!("commit");
                    log.clear();
                    let result = self
                        .host
                        .commit_transaction()
                        .map_err(|e| SyncError::HostTransaction(e.to_string()));
                    open = result.is_err() && open;
                    let _ = reply.send(result);
                }
                HostRequest::Rollback { reply } => {
                    debug!("rollback");
                    log.clear();
                    self.host.rollback_transaction();
                    open = false;
                    let _ = reply.send(());
                }
                HostRequest::Progress(percent) => on_progress(percent),
            }
        }

        if open {
            warn!("worker ended with an open transaction, rolling back");
            self.host.rollback_transaction();
        }

        worker.await.map_err(|e| SyncError::Worker(e.to_string()))?
    }
}

use crate::archive::{discover_sources, ExtractionArea, Source};
use crate::error::{ProcessingError, Result};
use crate::processors::report::{FileOutcome, IngestReport};
use crate::readers::{MeasurementReader, StationFile, StationReader};
use crate::storage::measurements::insert_measurement;
use crate::storage::{Database, StationResolver};
use crate::utils::filename::display_name;
use crate::utils::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Loads one station file into storage: one transaction per file.
#[derive(Clone)]
struct FileWorker {
    db: Database,
    resolver: Arc<StationResolver>,
    cancel: Arc<AtomicBool>,
}

impl FileWorker {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    async fn ingest(&self, path: &Path) -> Result<FileOutcome> {
        if self.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let file = StationFile::open(path)?;
        let station = StationReader::new().read_station(&file)?;

        // Resolve before opening the transaction so the resolver never waits
        // on a connection this file is holding.
        let resolution = self.resolver.resolve(&station).await?;
        let mut outcome = FileOutcome::new(path, resolution);
        let name = display_name(path);

        let mut tx = self.db.pool().begin().await?;
        for row in MeasurementReader::new().rows(&file) {
            if self.is_cancelled() {
                debug!("Rolling back {} after cancellation", name);
                return Err(ProcessingError::Cancelled);
            }
            match row {
                Ok(record) => {
                    insert_measurement(&mut tx, &record.for_station(resolution.id)).await?;
                    outcome.rows_inserted += 1;
                }
                Err(e) => {
                    warn!("{}: dropped row, {}", name, e);
                    outcome.rows_rejected += 1;
                }
            }
        }
        tx.commit().await?;

        debug!(
            "{}: {} rows stored, {} rejected (station {})",
            name, outcome.rows_inserted, outcome.rows_rejected, station.key()
        );
        Ok(outcome)
    }
}

/// Walks an input directory and persists every station file it can read.
pub struct Ingestor {
    worker: FileWorker,
    max_workers: usize,
    silent: bool,
    work_dir: Option<PathBuf>,
}

impl Ingestor {
    pub fn new(db: Database) -> Self {
        let resolver = Arc::new(StationResolver::new(db.pool().clone()));
        Self {
            worker: FileWorker {
                db,
                resolver,
                cancel: Arc::new(AtomicBool::new(false)),
            },
            max_workers: 1,
            silent: true,
            work_dir: None,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.worker.cancel = cancel;
        self
    }

    /// Show progress bars (off by default).
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.silent = !enabled;
        self
    }

    /// Expand archives below `dir` instead of the system temporary directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.worker.cancel.clone()
    }

    pub async fn ingest_directory(&self, dir: &Path, file_pattern: &str) -> Result<IngestReport> {
        let inventory = discover_sources(dir, file_pattern)?;
        let mut report = IngestReport::default();

        if inventory.is_empty() {
            warn!("Nothing to ingest in {}", dir.display());
            return Ok(report);
        }

        for source in &inventory.sources {
            if self.worker.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.ingest_source(source, &mut report).await?;
        }

        info!(
            "Ingestion finished: {} files ingested, {} skipped, {} rows, {} stations seen",
            report.files_ingested,
            report.files_skipped,
            report.rows_inserted,
            self.worker.resolver.cached_identities().await
        );
        Ok(report)
    }

    /// Ingest one archive or loose-file directory into `report`. Only
    /// run-level failures are returned; file and archive failures are recorded.
    pub async fn ingest_source(&self, source: &Source, report: &mut IngestReport) -> Result<()> {
        match source {
            Source::Archive(path) => {
                let area = match ExtractionArea::extract_in(path, self.work_dir.as_deref()) {
                    Ok(area) => area,
                    Err(e) => {
                        warn!("Skipping archive {}: {}", display_name(path), e);
                        report.record_failure(path, &e);
                        return Ok(());
                    }
                };

                let files = area.data_files();
                if files.is_empty() {
                    warn!(
                        "Archive {} holds no station files ({} entries)",
                        display_name(path),
                        area.extracted_entries()
                    );
                }
                let result = self.ingest_files(files, &source.label(), report).await;

                if let Err(e) = area.close() {
                    warn!("Could not remove extraction area for {}: {}", display_name(path), e);
                }
                result?;
                report.archives_processed += 1;
            }
            Source::Directory { files, .. } => {
                self.ingest_files(files.clone(), &source.label(), report).await?;
            }
        }
        Ok(())
    }

    /// Ingest a single station file on its own.
    pub async fn ingest_file(&self, path: &Path) -> Result<FileOutcome> {
        self.worker.ingest(path).await
    }

    async fn ingest_files(
        &self,
        files: Vec<PathBuf>,
        label: &str,
        report: &mut IngestReport,
    ) -> Result<()> {
        let progress = ProgressReporter::new(files.len() as u64, label, self.silent);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();

        for path in files {
            if self.worker.is_cancelled() {
                break;
            }
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ProcessingError::Cancelled)?;
            let worker = self.worker.clone();

            tasks.spawn(async move {
                let result = worker.ingest(&path).await;
                drop(permit);
                (path, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (path, result) = joined?;
            match result {
                Ok(outcome) => report.record_file(&outcome),
                Err(ProcessingError::Cancelled) => report.cancelled = true,
                Err(e) => {
                    warn!("Skipping {}: {}", display_name(&path), e);
                    report.record_failure(&path, &e);
                }
            }
            progress.increment(1);
        }

        if self.worker.is_cancelled() {
            report.cancelled = true;
            progress.finish_with_message(&format!("{}: cancelled", label));
        } else {
            progress.finish_with_message(&format!("{}: done", label));
        }
        Ok(())
    }
}

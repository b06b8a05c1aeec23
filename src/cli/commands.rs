use crate::cli::args::{AggregateArgs, Cli, Commands, IngestArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::processors::{AggregationReport, DailyAggregator, IngestReport, Ingestor};
use crate::storage::{AggregationScope, Database};
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Conventional status for a process ended by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Both halves of a `run` invocation.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub ingestion: IngestReport,
    pub aggregation: Option<AggregationReport>,
}

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level(), cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("Loaded settings: {:?}", settings);

    let cancel = Arc::new(AtomicBool::new(false));
    watch_for_interrupt(cancel.clone());

    match &cli.command {
        Commands::Ingest(args) => {
            let settings = ingest_settings(settings, args)?;
            let db = open_database(&settings).await?;
            let report = ingest(&cli, &settings, &db, args, cancel).await;
            db.close().await;
            let report = report?;

            print_report(&cli, &report, &report.summary())?;
            warn_if_incomplete(&report);
        }

        Commands::Aggregate(args) => {
            let settings = settings.with_overrides(args.database.clone(), None, None)?;
            let db = open_database(&settings).await?;
            let report = aggregate(&cli, &db, &aggregation_scope(args), cancel).await;
            db.close().await;
            let report = report?;

            print_report(&cli, &report, &report.summary())?;
        }

        Commands::Run(args) => {
            let settings = ingest_settings(settings, args)?;
            let db = open_database(&settings).await?;
            let report = ingest_then_aggregate(&cli, &settings, &db, args, cancel).await;
            db.close().await;
            let report = report?;

            let mut text = report.ingestion.summary();
            if let Some(aggregation) = &report.aggregation {
                text.push('\n');
                text.push_str(&aggregation.summary());
            }
            print_report(&cli, &report, &text)?;
            warn_if_incomplete(&report.ingestion);
        }
    }

    Ok(())
}

async fn ingest(
    cli: &Cli,
    settings: &Settings,
    db: &Database,
    args: &IngestArgs,
    cancel: Arc<AtomicBool>,
) -> Result<IngestReport> {
    info!("Ingesting station files from {}", args.input_dir.display());
    let cpus = num_cpus::get();
    if settings.max_workers > cpus {
        warn!(
            "{} workers requested on {} CPUs; extra workers will mostly wait on the database",
            settings.max_workers, cpus
        );
    }

    Ingestor::new(db.clone())
        .with_max_workers(settings.max_workers)
        .with_cancel_flag(cancel)
        .with_progress(cli.show_progress())
        .ingest_directory(&args.input_dir, &settings.file_pattern)
        .await
}

async fn aggregate(
    cli: &Cli,
    db: &Database,
    scope: &AggregationScope,
    cancel: Arc<AtomicBool>,
) -> Result<AggregationReport> {
    let progress = ProgressReporter::new_spinner("Aggregating daily values...", !cli.show_progress());
    DailyAggregator::new(db.clone())
        .with_cancel_flag(cancel)
        .run(scope, Some(&progress))
        .await
}

async fn ingest_then_aggregate(
    cli: &Cli,
    settings: &Settings,
    db: &Database,
    args: &IngestArgs,
    cancel: Arc<AtomicBool>,
) -> Result<RunReport> {
    let ingestion = ingest(cli, settings, db, args, cancel.clone()).await?;

    let aggregation = if ingestion.cancelled {
        warn!("Ingestion was interrupted; daily aggregation skipped");
        None
    } else {
        Some(aggregate(cli, db, &AggregationScope::all(), cancel).await?)
    };

    Ok(RunReport {
        ingestion,
        aggregation,
    })
}

fn ingest_settings(settings: Settings, args: &IngestArgs) -> Result<Settings> {
    settings.with_overrides(
        args.database.clone(),
        args.max_workers,
        args.file_pattern.clone(),
    )
}

fn aggregation_scope(args: &AggregateArgs) -> AggregationScope {
    AggregationScope {
        station_id: args.station_id,
        from: args.from,
        to: args.to,
    }
}

async fn open_database(settings: &Settings) -> Result<Database> {
    Database::connect(
        &settings.database_url,
        settings.max_connections(),
        settings.busy_timeout(),
    )
    .await
}

fn print_report<T: Serialize>(cli: &Cli, report: &T, text: &str) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("\n{}", text);
    }
    Ok(())
}

fn warn_if_incomplete(report: &IngestReport) {
    if report.is_empty() {
        eprintln!("⚠️  No station files were found");
        return;
    }
    if report.archives_failed > 0 || report.files_skipped > 0 {
        eprintln!(
            "⚠️  {} archive(s) and {} file(s) were skipped; their data was not loaded",
            report.archives_failed, report.files_skipped
        );
    }
    if report.rows_rejected > 0 {
        eprintln!("⚠️  {} malformed row(s) were dropped", report.rows_rejected);
    }
    if report.cancelled {
        eprintln!("⚠️  Run was interrupted before every file was loaded");
    }
}

/// Ctrl-C stops new work and rolls back whatever transaction is open.
/// A second Ctrl-C exits at once.
fn watch_for_interrupt(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nReceived CTRL+C, rolling back open work (press again to exit now)...");
        cancel.store(true, Ordering::Relaxed);

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived second CTRL+C, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}

pub fn setup_logging(level: &str, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("inmet_processor={}", level)));

    let result = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", level);
    }
}

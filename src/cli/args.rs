use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inmet-processor")]
#[command(about = "Loads INMET automatic-station exports into SQLite and builds daily aggregates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        env = "INMET_CONFIG",
        help = "Settings file [default: ./inmet-processor.toml if present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print the final report as JSON")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every station file found in a directory of ZIP archives and/or CSV files
    Ingest(IngestArgs),

    /// Rebuild daily aggregates from stored hourly measurements
    Aggregate(AggregateArgs),

    /// Ingest a directory, then rebuild all daily aggregates
    Run(IngestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(short, long, help = "Directory holding yearly ZIP archives or station CSV files")]
    pub input_dir: PathBuf,

    #[arg(short, long, help = "Database URL [default: sqlite://clima.db]")]
    pub database: Option<String>,

    #[arg(long, help = "Only process files whose name contains this text (e.g. '_DF_')")]
    pub file_pattern: Option<String>,

    #[arg(long, help = "Station files loaded concurrently [default: 1]")]
    pub max_workers: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    #[arg(short, long, help = "Database URL [default: sqlite://clima.db]")]
    pub database: Option<String>,

    #[arg(short, long, help = "Only aggregate this station id")]
    pub station_id: Option<i64>,

    #[arg(long, help = "First date to aggregate (YYYY-MM-DD)")]
    pub from: Option<NaiveDate>,

    #[arg(long, help = "Last date to aggregate (YYYY-MM-DD)")]
    pub to: Option<NaiveDate>,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Progress bars would interleave with JSON or be noise in quiet mode.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

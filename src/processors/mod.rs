pub mod aggregator;
pub mod ingestion;
pub mod report;

pub use aggregator::{DailyAccumulator, DailyAggregator};
pub use ingestion::Ingestor;
pub use report::{AggregationReport, FileOutcome, IngestReport, SkippedUnit};

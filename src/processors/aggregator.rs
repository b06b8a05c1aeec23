use crate::error::{ProcessingError, Result};
use crate::models::{DailyAggregate, Reading, Readings, Reducer, READING_COUNT};
use crate::processors::report::AggregationReport;
use crate::storage::daily::{
    date_from_row, delete_daily, insert_daily, reading_select_list, readings_from_row,
};
use crate::storage::{AggregationScope, Database};
use crate::utils::progress::ProgressReporter;
use chrono::NaiveDate;
use futures::TryStreamExt;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Running per-reading sum and count of present values for one station-day.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyAccumulator {
    sums: [f64; READING_COUNT],
    counts: [u32; READING_COUNT],
    rows: usize,
}

impl DailyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, readings: &Readings) {
        for (reading, value) in readings.iter() {
            if let Some(value) = value {
                self.sums[reading.index()] += value;
                self.counts[reading.index()] += 1;
            }
        }
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The day's readings: sum or mean of present values, absent when none were.
    pub fn finish(&self) -> Readings {
        let mut readings = Readings::new();
        for reading in Reading::ALL {
            let i = reading.index();
            if self.counts[i] == 0 {
                continue;
            }
            let value = match reading.reducer() {
                Reducer::Sum => self.sums[i],
                Reducer::Mean => self.sums[i] / f64::from(self.counts[i]),
            };
            readings.set(reading, Some(value));
        }
        readings
    }
}

/// Collapses stored hourly measurements into one row per station and date.
pub struct DailyAggregator {
    db: Database,
    cancel: Arc<AtomicBool>,
}

impl DailyAggregator {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop at the next measurement once `cancel` is set; nothing is written.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Recompute the daily rows in `scope`, replacing whatever was stored there.
    pub async fn run(
        &self,
        scope: &AggregationScope,
        progress: Option<&ProgressReporter>,
    ) -> Result<AggregationReport> {
        info!("Aggregating daily values for {}", scope);
        let mut report = AggregationReport {
            scope: *scope,
            ..AggregationReport::default()
        };

        if self.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut aggregates: Vec<DailyAggregate> = Vec::new();

        // Rows without a station or a date belong to no station-day.
        let mut unkeyed = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM dados_meteorologicos \
             WHERE (estacao_id IS NULL OR data IS NULL)",
        );
        scope.push_filter(&mut unkeyed);
        let ignored = unkeyed.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;
        report.rows_ignored = ignored as u64;
        if report.rows_ignored > 0 {
            warn!(
                "Ignoring {} measurements with no station or date",
                report.rows_ignored
            );
        }

        {
            let mut query = QueryBuilder::<Sqlite>::new(format!(
                "SELECT estacao_id, CAST(data AS TEXT) AS data, {} \
                 FROM dados_meteorologicos \
                 WHERE estacao_id IS NOT NULL AND data IS NOT NULL",
                reading_select_list()
            ));
            scope.push_filter(&mut query);
            query.push(" ORDER BY estacao_id, data");

            let mut rows = query.build().fetch(&mut *tx);
            let mut current: Option<(i64, NaiveDate, DailyAccumulator)> = None;

            while let Some(row) = rows.try_next().await? {
                if self.is_cancelled() {
                    debug!("Daily aggregation cancelled; rolling back");
                    return Err(ProcessingError::Cancelled);
                }
                let station_id: i64 = row.try_get("estacao_id")?;
                let date = date_from_row(&row, "data")?;
                let readings = readings_from_row(&row)?;
                report.measurements_read += 1;

                match current.as_mut() {
                    Some((id, day, acc)) if *id == station_id && *day == date => acc.add(&readings),
                    _ => {
                        if let Some((id, day, acc)) = current.take() {
                            trace!("Station {} on {}: {} hourly rows", id, day, acc.rows());
                            aggregates.push(DailyAggregate::new(id, day, acc.finish()));
                        }
                        let mut acc = DailyAccumulator::new();
                        acc.add(&readings);
                        current = Some((station_id, date, acc));
                    }
                }

                if report.measurements_read % 10_000 == 0 {
                    if let Some(p) = progress {
                        p.set_message(&format!(
                            "Aggregating... {} measurements read",
                            report.measurements_read
                        ));
                    }
                }
            }

            if let Some((id, day, acc)) = current.take() {
                aggregates.push(DailyAggregate::new(id, day, acc.finish()));
            }
        }

        report.days_replaced = delete_daily(&mut tx, scope).await?;
        debug!("Removed {} stale daily rows", report.days_replaced);

        let mut last_station = None;
        for aggregate in &aggregates {
            insert_daily(&mut tx, aggregate).await?;
            report.days_written += 1;
            if last_station != Some(aggregate.station_id) {
                report.stations += 1;
                last_station = Some(aggregate.station_id);
            }
        }

        tx.commit().await?;

        info!(
            "Wrote {} daily rows for {} stations from {} measurements",
            report.days_written, report.stations, report.measurements_read
        );
        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} station-days", report.days_written));
        }

        Ok(report)
    }
}

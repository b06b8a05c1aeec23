use crate::error::{ProcessingError, Result};
use crate::models::{DailyAggregate, Reading, Readings};
use crate::utils::constants::{DAILY_TABLE, DATE_FORMAT};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::sync::OnceLock;

/// Which (station, date) groups an aggregation pass covers. Empty means all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregationScope {
    pub station_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AggregationScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn station(station_id: i64) -> Self {
        Self {
            station_id: Some(station_id),
            ..Self::default()
        }
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn is_all(&self) -> bool {
        self.station_id.is_none() && self.from.is_none() && self.to.is_none()
    }

    /// Append ` AND ...` conditions on `estacao_id` and `data`.
    pub fn push_filter(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(id) = self.station_id {
            query.push(" AND estacao_id = ").push_bind(id);
        }
        if let Some(from) = self.from {
            query
                .push(" AND data >= ")
                .push_bind(from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = self.to {
            query
                .push(" AND data <= ")
                .push_bind(to.format(DATE_FORMAT).to_string());
        }
    }
}

impl std::fmt::Display for AggregationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_all() {
            return write!(f, "all stations, all dates");
        }
        match self.station_id {
            Some(id) => write!(f, "station {}", id)?,
            None => write!(f, "all stations")?,
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => write!(f, ", {} to {}", from, to),
            (Some(from), None) => write!(f, ", from {}", from),
            (None, Some(to)) => write!(f, ", up to {}", to),
            (None, None) => Ok(()),
        }
    }
}

fn insert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let columns: Vec<&str> = Reading::ALL.iter().map(|r| r.column()).collect();
        let placeholders = vec!["?"; columns.len() + 2].join(", ");
        format!(
            "INSERT INTO {DAILY_TABLE} (estacao_id, data, {}) VALUES ({})",
            columns.join(", "),
            placeholders
        )
    })
}

/// `SELECT` list reading every reading column back as REAL.
pub fn reading_select_list() -> String {
    Reading::ALL
        .iter()
        .map(|r| format!("CAST({0} AS REAL) AS {0}", r.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode the reading columns produced by `reading_select_list`.
pub fn readings_from_row(row: &SqliteRow) -> Result<Readings> {
    let mut readings = Readings::new();
    for reading in Reading::ALL {
        readings.set(reading, row.try_get(reading.column())?);
    }
    Ok(readings)
}

pub fn date_from_row(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    let text: String = row.try_get(column)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|_| ProcessingError::StoredValue(format!("date '{}' in column {}", text, column)))
}

pub async fn delete_daily(conn: &mut SqliteConnection, scope: &AggregationScope) -> Result<u64> {
    let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM dados_meteorologicos_diarios WHERE 1 = 1");
    scope.push_filter(&mut query);
    let result = query.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn insert_daily(conn: &mut SqliteConnection, aggregate: &DailyAggregate) -> Result<i64> {
    let mut query = sqlx::query(insert_sql())
        .bind(aggregate.station_id)
        .bind(aggregate.date.format(DATE_FORMAT).to_string());

    for value in aggregate.readings.values() {
        query = query.bind(*value);
    }

    let result = query.execute(conn).await?;
    Ok(result.last_insert_rowid())
}

/// Stored daily rows in scope, ordered by station and date.
pub async fn fetch_daily(pool: &SqlitePool, scope: &AggregationScope) -> Result<Vec<DailyAggregate>> {
    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT id, estacao_id, CAST(data AS TEXT) AS data, {} \
         FROM dados_meteorologicos_diarios WHERE 1 = 1",
        reading_select_list()
    ));
    scope.push_filter(&mut query);
    query.push(" ORDER BY estacao_id, data, id");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            Ok(DailyAggregate {
                id: Some(row.try_get("id")?),
                station_id: row.try_get("estacao_id")?,
                date: date_from_row(row, "data")?,
                readings: readings_from_row(row)?,
            })
        })
        .collect()
}

use crate::error::Result;
use crate::models::{Measurement, Reading};
use crate::utils::constants::{DATE_FORMAT, MEASUREMENT_TABLE, TIME_FORMAT};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::OnceLock;

fn insert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let columns: Vec<&str> = Reading::ALL.iter().map(|r| r.column()).collect();
        let placeholders = vec!["?"; columns.len() + 3].join(", ");
        format!(
            "INSERT INTO {MEASUREMENT_TABLE} (estacao_id, data, hora, {}) VALUES ({})",
            columns.join(", "),
            placeholders
        )
    })
}

/// Insert one measurement on `conn`, normally a per-file transaction.
pub async fn insert_measurement(conn: &mut SqliteConnection, measurement: &Measurement) -> Result<i64> {
    let mut query = sqlx::query(insert_sql())
        .bind(measurement.station_id)
        .bind(measurement.date.format(DATE_FORMAT).to_string())
        .bind(measurement.time.format(TIME_FORMAT).to_string());

    for value in measurement.readings.values() {
        query = query.bind(*value);
    }

    let result = query.execute(conn).await?;
    Ok(result.last_insert_rowid())
}

pub async fn count_measurements(pool: &SqlitePool, station_id: Option<i64>) -> Result<i64> {
    let count = match station_id {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM dados_meteorologicos WHERE estacao_id = ?")
                .bind(id)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM dados_meteorologicos")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

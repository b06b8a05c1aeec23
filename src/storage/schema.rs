//! DDL for the three tables downstream query tools read.
//!
//! Column names, declared types and nullability match what the existing
//! databases were created with, so those files can be ingested into as-is.

use crate::error::Result;
use crate::models::Reading;
use crate::utils::constants::{DAILY_TABLE, MEASUREMENT_TABLE, STATION_TABLE};
use sqlx::SqlitePool;
use tracing::debug;

const READING_TYPE: &str = "NUMERIC(10, 2)";

fn reading_columns_ddl() -> String {
    Reading::ALL
        .iter()
        .map(|r| format!("\t{} {},\n", r.column(), READING_TYPE))
        .collect()
}

pub fn station_table_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {STATION_TABLE} (\n\
         \tid INTEGER NOT NULL,\n\
         \tregiao VARCHAR,\n\
         \tuf VARCHAR(2),\n\
         \tnome_estacao VARCHAR,\n\
         \tcodigo_wmo VARCHAR(10),\n\
         \tlatitude NUMERIC(10, 8),\n\
         \tlongitude NUMERIC(10, 8),\n\
         \taltitude NUMERIC(10, 2),\n\
         \tdata_fundacao DATE,\n\
         \tPRIMARY KEY (id)\n\
         )"
    )
}

pub fn measurement_table_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {MEASUREMENT_TABLE} (\n\
         \tid INTEGER NOT NULL,\n\
         \testacao_id INTEGER,\n\
         \tdata DATE,\n\
         \thora TIME,\n\
         {readings}\
         \tPRIMARY KEY (id),\n\
         \tFOREIGN KEY(estacao_id) REFERENCES {STATION_TABLE} (id)\n\
         )",
        readings = reading_columns_ddl()
    )
}

pub fn daily_table_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {DAILY_TABLE} (\n\
         \tid INTEGER NOT NULL,\n\
         \testacao_id INTEGER,\n\
         \tdata DATE,\n\
         {readings}\
         \tPRIMARY KEY (id),\n\
         \tFOREIGN KEY(estacao_id) REFERENCES {STATION_TABLE} (id)\n\
         )",
        readings = reading_columns_ddl()
    )
}

/// Lookup indexes only; none of them constrains existing data.
pub fn index_ddl() -> Vec<String> {
    vec![
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{STATION_TABLE}_identidade \
             ON {STATION_TABLE} (nome_estacao, codigo_wmo)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{MEASUREMENT_TABLE}_estacao_data \
             ON {MEASUREMENT_TABLE} (estacao_id, data)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{DAILY_TABLE}_estacao_data \
             ON {DAILY_TABLE} (estacao_id, data)"
        ),
    ]
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    let mut statements = vec![
        station_table_ddl(),
        measurement_table_ddl(),
        daily_table_ddl(),
    ];
    statements.extend(index_ddl());

    for statement in &statements {
        sqlx::query(statement).execute(pool).await?;
    }

    debug!("Schema ready ({} statements)", statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_ddl_lists_every_reading() {
        let ddl = measurement_table_ddl();
        for reading in Reading::ALL {
            assert!(
                ddl.contains(&format!("{} NUMERIC(10, 2)", reading.column())),
                "missing {}",
                reading
            );
        }
        assert!(ddl.contains("hora TIME"));
        assert!(ddl.contains("REFERENCES estacao (id)"));
    }

    #[test]
    fn test_daily_ddl_has_no_time_column() {
        let ddl = daily_table_ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS dados_meteorologicos_diarios"));
        assert!(!ddl.contains("hora"));
        assert!(ddl.contains("radiacao_global_KJ_m2 NUMERIC(10, 2)"));
    }

    #[test]
    fn test_station_ddl_column_types() {
        let ddl = station_table_ddl();
        assert!(ddl.contains("uf VARCHAR(2)"));
        assert!(ddl.contains("codigo_wmo VARCHAR(10)"));
        assert!(ddl.contains("latitude NUMERIC(10, 8)"));
        assert!(ddl.contains("data_fundacao DATE"));
    }
}

use crate::error::{ProcessingError, Result};
use crate::models::{Station, StationKey};
use crate::utils::constants::DATE_FORMAT;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Outcome of resolving a station against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: i64,
    pub created: bool,
}

/// Maps station records to stable ids, inserting a station the first time
/// its (name, WMO code) identity is seen.
///
/// Lookup and insert run under one lock, so concurrent workers can never
/// create the same station twice. Later records for a known identity are
/// ignored: the first description stored wins.
pub struct StationResolver {
    pool: SqlitePool,
    known: Mutex<HashMap<StationKey, i64>>,
}

impl StationResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            known: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, station: &Station) -> Result<Resolution> {
        let key = station.key();
        let mut known = self.known.lock().await;

        if let Some(&id) = known.get(&key) {
            return Ok(Resolution { id, created: false });
        }

        let resolution = match find_station_id(&self.pool, &key).await? {
            Some(id) => {
                debug!("Station {} already stored as id {}", key, id);
                Resolution { id, created: false }
            }
            None => {
                let id = insert_station(&self.pool, station).await?;
                info!("Registered station {} as id {}", key, id);
                Resolution { id, created: true }
            }
        };

        known.insert(key, resolution.id);
        Ok(resolution)
    }

    pub async fn cached_identities(&self) -> usize {
        self.known.lock().await.len()
    }
}

/// Id of the station with this identity, if stored.
///
/// More than one stored row for an identity means the table was written
/// outside this resolver; that is reported rather than guessed around.
pub async fn find_station_id(pool: &SqlitePool, key: &StationKey) -> Result<Option<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM estacao WHERE nome_estacao = ? AND codigo_wmo = ? ORDER BY id",
    )
    .bind(&key.name)
    .bind(&key.wmo_code)
    .fetch_all(pool)
    .await?;

    match ids.len() {
        0 => Ok(None),
        1 => Ok(Some(ids[0])),
        count => Err(ProcessingError::IdentityConflict {
            name: key.name.clone(),
            wmo_code: key.wmo_code.clone(),
            count: count as i64,
        }),
    }
}

async fn insert_station(pool: &SqlitePool, station: &Station) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO estacao \
         (regiao, uf, nome_estacao, codigo_wmo, latitude, longitude, altitude, data_fundacao) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&station.region)
    .bind(&station.uf)
    .bind(&station.name)
    .bind(&station.wmo_code)
    .bind(station.latitude)
    .bind(station.longitude)
    .bind(station.altitude)
    .bind(station.founding_date.format(DATE_FORMAT).to_string())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load a stored station by identity.
pub async fn find_station(pool: &SqlitePool, key: &StationKey) -> Result<Option<Station>> {
    let row = sqlx::query(
        "SELECT id, regiao, uf, nome_estacao, codigo_wmo, \
         CAST(latitude AS REAL) AS latitude, \
         CAST(longitude AS REAL) AS longitude, \
         CAST(altitude AS REAL) AS altitude, \
         CAST(data_fundacao AS TEXT) AS data_fundacao \
         FROM estacao WHERE nome_estacao = ? AND codigo_wmo = ? ORDER BY id LIMIT 1",
    )
    .bind(&key.name)
    .bind(&key.wmo_code)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let founded: String = row.try_get("data_fundacao")?;
    let founding_date = NaiveDate::parse_from_str(&founded, DATE_FORMAT).map_err(|_| {
        ProcessingError::StoredValue(format!("founding date '{}' of station {}", founded, key))
    })?;

    Ok(Some(Station {
        id: Some(row.try_get("id")?),
        region: row.try_get("regiao")?,
        uf: row.try_get("uf")?,
        name: row.try_get("nome_estacao")?,
        wmo_code: row.try_get("codigo_wmo")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        altitude: row.try_get("altitude")?,
        founding_date,
    }))
}

pub async fn count_stations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM estacao")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

use crate::models::Readings;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One parsed data row of a station file, not yet tied to a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub readings: Readings,
}

/// A measurement row as held in `dados_meteorologicos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: Option<i64>,
    pub station_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub readings: Readings,
}

impl MeasurementRecord {
    pub fn new(date: NaiveDate, time: NaiveTime, readings: Readings) -> Self {
        Self {
            date,
            time,
            readings,
        }
    }

    pub fn for_station(self, station_id: i64) -> Measurement {
        Measurement {
            id: None,
            station_id,
            date: self.date,
            time: self.time,
            readings: self.readings,
        }
    }
}

/// One reduced row per (station, date) in `dados_meteorologicos_diarios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub id: Option<i64>,
    pub station_id: i64,
    pub date: NaiveDate,
    pub readings: Readings,
}

impl DailyAggregate {
    pub fn new(station_id: i64, date: NaiveDate, readings: Readings) -> Self {
        Self {
            id: None,
            station_id,
            date,
            readings,
        }
    }
}

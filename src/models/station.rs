use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A weather station as described by the header block of its data file.
///
/// `id` is `None` until the station has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: Option<i64>,
    pub region: String,
    pub uf: String,
    pub name: String,
    pub wmo_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub founding_date: NaiveDate,
}

/// The (display name, WMO code) pair a station is identified by.
///
/// WMO codes repeat across historical entries with different names, so the
/// code alone is not an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationKey {
    pub name: String,
    pub wmo_code: String,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        region: String,
        uf: String,
        name: String,
        wmo_code: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        altitude: Option<f64>,
        founding_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            region,
            uf,
            name,
            wmo_code,
            latitude,
            longitude,
            altitude,
            founding_date,
        }
    }

    pub fn key(&self) -> StationKey {
        StationKey {
            name: self.name.clone(),
            wmo_code: self.wmo_code.clone(),
        }
    }
}

impl std::fmt::Display for StationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.wmo_code)
    }
}

use serde::{Deserialize, Serialize};

pub const READING_COUNT: usize = 17;

/// One of the hourly sensor readings carried by every measurement row.
///
/// Variant order is the positional order of the reading cells in a station
/// file and of the reading columns in the persisted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reading {
    Precipitation,
    StationPressure,
    PressureMax,
    PressureMin,
    GlobalRadiation,
    DryBulbTemperature,
    DewPoint,
    TemperatureMax,
    TemperatureMin,
    DewPointMax,
    DewPointMin,
    RelativeHumidityMax,
    RelativeHumidityMin,
    RelativeHumidity,
    WindDirection,
    WindGust,
    WindSpeed,
}

/// How a day's worth of a reading collapses into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
}

impl Reading {
    pub const ALL: [Reading; READING_COUNT] = [
        Reading::Precipitation,
        Reading::StationPressure,
        Reading::PressureMax,
        Reading::PressureMin,
        Reading::GlobalRadiation,
        Reading::DryBulbTemperature,
        Reading::DewPoint,
        Reading::TemperatureMax,
        Reading::TemperatureMin,
        Reading::DewPointMax,
        Reading::DewPointMin,
        Reading::RelativeHumidityMax,
        Reading::RelativeHumidityMin,
        Reading::RelativeHumidity,
        Reading::WindDirection,
        Reading::WindGust,
        Reading::WindSpeed,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name in `dados_meteorologicos` and `dados_meteorologicos_diarios`.
    pub fn column(self) -> &'static str {
        match self {
            Reading::Precipitation => "precipitacao_total_mm",
            Reading::StationPressure => "pressao_nivel_estacao_mB",
            Reading::PressureMax => "pressao_max_ant_mB",
            Reading::PressureMin => "pressao_min_ant_mB",
            Reading::GlobalRadiation => "radiacao_global_KJ_m2",
            Reading::DryBulbTemperature => "temp_bulbo_seco_C",
            Reading::DewPoint => "temp_ponto_orvalho_C",
            Reading::TemperatureMax => "temp_max_ant_C",
            Reading::TemperatureMin => "temp_min_ant_C",
            Reading::DewPointMax => "temp_orvalho_max_ant_C",
            Reading::DewPointMin => "temp_orvalho_min_ant_C",
            Reading::RelativeHumidityMax => "umidade_rel_max_ant_pct",
            Reading::RelativeHumidityMin => "umidade_rel_min_ant_pct",
            Reading::RelativeHumidity => "umidade_rel_ar_pct",
            Reading::WindDirection => "vento_direcao_graus",
            Reading::WindGust => "vento_rajada_max_ms",
            Reading::WindSpeed => "vento_velocidade_ms",
        }
    }

    /// Radiation is accumulated energy, so a day is the sum of its hours.
    pub fn reducer(self) -> Reducer {
        match self {
            Reading::GlobalRadiation => Reducer::Sum,
            _ => Reducer::Mean,
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// The full reading set of a row, each value present or explicitly absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    values: [Option<f64>; READING_COUNT],
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reading: Reading) -> Option<f64> {
        self.values[reading.index()]
    }

    pub fn set(&mut self, reading: Reading, value: Option<f64>) {
        self.values[reading.index()] = value;
    }

    pub fn with(mut self, reading: Reading, value: f64) -> Self {
        self.set(reading, Some(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Reading, Option<f64>)> + '_ {
        Reading::ALL.iter().map(move |r| (*r, self.get(*r)))
    }

    pub fn values(&self) -> &[Option<f64>; READING_COUNT] {
        &self.values
    }
}

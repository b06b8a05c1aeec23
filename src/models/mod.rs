pub mod measurement;
pub mod reading;
pub mod station;

pub use measurement::{DailyAggregate, Measurement, MeasurementRecord};
pub use reading::{Reading, Readings, Reducer, READING_COUNT};
pub use station::{Station, StationKey};

pub mod dialect;
pub mod measurement_reader;
pub mod source_file;
pub mod station_reader;
pub mod temporal;
pub mod values;

pub use dialect::{ColumnLayout, FileDialect, HeaderLayout, MetadataField};
pub use measurement_reader::{MeasurementReader, MeasurementRows};
pub use source_file::{decode_bytes, StationFile};
pub use station_reader::StationReader;
pub use temporal::{parse_date, parse_time};
pub use values::normalize_value;

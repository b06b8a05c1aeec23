/// Reserved reading value meaning "no observation"
pub const MISSING_SENTINEL: f64 = -9999.0;

/// Two-digit years below this are 20xx, the rest 19xx (POSIX `%y` convention)
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 69;

/// File extensions
pub const ARCHIVE_EXTENSION: &str = "zip";
pub const DATA_FILE_EXTENSION: &str = "csv";

/// Table names
pub const STATION_TABLE: &str = "estacao";
pub const MEASUREMENT_TABLE: &str = "dados_meteorologicos";
pub const DAILY_TABLE: &str = "dados_meteorologicos_diarios";

/// Persisted date/time text formats
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.6f";

/// Processing defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://clima.db";
pub const DEFAULT_MAX_WORKERS: usize = 1;
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIG_FILE: &str = "inmet-processor.toml";
pub const ENV_PREFIX: &str = "INMET";

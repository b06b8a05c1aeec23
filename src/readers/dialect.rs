//! Positional layouts of station files.
//!
//! Header labels and column titles are routinely mangled by encoding
//! mismatches, so nothing here looks at their text. Every field is located by
//! line or cell index, and the tables below are the only place those indexes
//! live.

use crate::models::Reading;

/// Header fields, in the order of the `label;value` lines opening every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Region,
    Uf,
    StationName,
    WmoCode,
    Latitude,
    Longitude,
    Altitude,
    FoundingDate,
}

pub const METADATA_FIELDS: [MetadataField; 8] = [
    MetadataField::Region,
    MetadataField::Uf,
    MetadataField::StationName,
    MetadataField::WmoCode,
    MetadataField::Latitude,
    MetadataField::Longitude,
    MetadataField::Altitude,
    MetadataField::FoundingDate,
];

pub const METADATA_LINES: usize = METADATA_FIELDS.len();

impl MetadataField {
    /// Zero-based line index of this field in the header block.
    pub fn line_index(self) -> usize {
        self as usize
    }
}

/// How the header block ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Data rows start right after the metadata lines.
    Bare,
    /// One column-title line sits between the metadata and the data.
    Titled,
}

impl HeaderLayout {
    /// Lines to skip before the first data row.
    pub fn skip_lines(self) -> usize {
        match self {
            HeaderLayout::Bare => METADATA_LINES,
            HeaderLayout::Titled => METADATA_LINES + 1,
        }
    }

    /// Inspect the line after the metadata block. A column title (`Data`,
    /// `DATA (YYYY-MM-DD)`) has no digits in its first cell; anything else is
    /// a data row, malformed or not, and is left to the row extractor.
    pub fn detect(lines: &[&str]) -> Self {
        match lines.get(METADATA_LINES) {
            Some(line) if is_title_line(line) => HeaderLayout::Titled,
            _ => HeaderLayout::Bare,
        }
    }
}

fn is_title_line(line: &str) -> bool {
    let first_cell = line.split(';').next().unwrap_or("");
    !first_cell.trim().is_empty() && !first_cell.chars().any(|c| c.is_ascii_digit())
}

/// Cell layout of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// `date;time;` followed by the 17 readings in `Reading::ALL` order.
    V1,
}

const V1_READING_CELLS: [(usize, Reading); 17] = [
    (2, Reading::Precipitation),
    (3, Reading::StationPressure),
    (4, Reading::PressureMax),
    (5, Reading::PressureMin),
    (6, Reading::GlobalRadiation),
    (7, Reading::DryBulbTemperature),
    (8, Reading::DewPoint),
    (9, Reading::TemperatureMax),
    (10, Reading::TemperatureMin),
    (11, Reading::DewPointMax),
    (12, Reading::DewPointMin),
    (13, Reading::RelativeHumidityMax),
    (14, Reading::RelativeHumidityMin),
    (15, Reading::RelativeHumidity),
    (16, Reading::WindDirection),
    (17, Reading::WindGust),
    (18, Reading::WindSpeed),
];

impl ColumnLayout {
    pub fn date_cell(self) -> usize {
        match self {
            ColumnLayout::V1 => 0,
        }
    }

    pub fn time_cell(self) -> usize {
        match self {
            ColumnLayout::V1 => 1,
        }
    }

    pub fn reading_cells(self) -> &'static [(usize, Reading)] {
        match self {
            ColumnLayout::V1 => &V1_READING_CELLS,
        }
    }

    /// Cells a row must have; anything past these has to be empty.
    pub fn required_cells(self) -> usize {
        match self {
            ColumnLayout::V1 => 19,
        }
    }
}

/// Everything the extractors need to know about a file before reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDialect {
    pub header: HeaderLayout,
    pub columns: ColumnLayout,
}

impl FileDialect {
    pub fn detect(lines: &[&str]) -> Self {
        Self {
            header: HeaderLayout::detect(lines),
            columns: ColumnLayout::V1,
        }
    }
}

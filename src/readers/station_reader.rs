use crate::error::{FormatError, ProcessingError, Result};
use crate::models::Station;
use crate::readers::dialect::{MetadataField, METADATA_FIELDS};
use crate::readers::source_file::StationFile;
use crate::readers::temporal::parse_date;
use crate::readers::values::normalize_value;

/// Builds a `Station` from the header block of a station file.
pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read the station described by a file's header.
    ///
    /// Every row of the file hangs off this record, so any defect here
    /// rejects the whole file.
    pub fn read_station(&self, file: &StationFile) -> Result<Station> {
        self.parse_header(&file.header_lines())
            .map_err(|error| ProcessingError::format(file.path(), error))
    }

    pub fn parse_header(&self, lines: &[&str]) -> std::result::Result<Station, FormatError> {
        let mut values: Vec<&str> = Vec::with_capacity(METADATA_FIELDS.len());
        for field in METADATA_FIELDS {
            values.push(self.field_value(lines, field)?);
        }

        let value = |field: MetadataField| values[field.line_index()];

        Ok(Station::new(
            value(MetadataField::Region).to_string(),
            value(MetadataField::Uf).to_string(),
            value(MetadataField::StationName).to_string(),
            value(MetadataField::WmoCode).to_string(),
            normalize_value(value(MetadataField::Latitude)),
            normalize_value(value(MetadataField::Longitude)),
            normalize_value(value(MetadataField::Altitude)),
            parse_date(value(MetadataField::FoundingDate))?,
        ))
    }

    /// The value half of a `label;value` line. Some exports add a trailing `;`.
    fn field_value<'a>(
        &self,
        lines: &[&'a str],
        field: MetadataField,
    ) -> std::result::Result<&'a str, FormatError> {
        let index = field.line_index();
        let line: &'a str = lines
            .get(index)
            .copied()
            .ok_or(FormatError::MissingLine { line: index + 1 })?;

        let (_label, rest) = line
            .split_once(';')
            .ok_or_else(|| FormatError::MissingSeparator {
                line: index + 1,
                content: line.trim().to_string(),
            })?;

        Ok(rest.split(';').next().unwrap_or("").trim())
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn legacy_header() -> Vec<&'static str> {
        vec![
            "REGI\u{FFFD}O:;CO",
            "UF:;DF",
            "ESTA\u{FFFD}\u{FFFD}O:;BRASILIA",
            "CODIGO (WMO):;A001",
            "LATITUDE:;-15,78944444",
            "LONGITUDE:;-47,92583332",
            "ALTITUDE:;1160,96",
            "DATA DE FUNDA\u{FFFD}\u{FFFD}O (YYYY-MM-DD):;2000-05-07",
        ]
    }

    #[test]
    fn test_parse_legacy_header() {
        let station = StationReader::new().parse_header(&legacy_header()).unwrap();

        assert_eq!(station.id, None);
        assert_eq!(station.region, "CO");
        assert_eq!(station.uf, "DF");
        assert_eq!(station.name, "BRASILIA");
        assert_eq!(station.wmo_code, "A001");
        assert_eq!(station.latitude, Some(-15.78944444));
        assert_eq!(station.longitude, Some(-47.92583332));
        assert_eq!(station.altitude, Some(1160.96));
        assert_eq!(
            station.founding_date,
            NaiveDate::from_ymd_opt(2000, 5, 7).unwrap()
        );
    }

    #[test]
    fn test_parse_short_year_header_with_trailing_separator() {
        let lines = vec![
            "REGIAO:;S;",
            "UF:;RS;",
            "ESTACAO:;PORTO ALEGRE;",
            "CODIGO (WMO):;A801;",
            "LATITUDE:;-30,05;",
            "LONGITUDE:;-51,17472221;",
            "ALTITUDE:;-9999;",
            "DATA DE FUNDACAO:;22/09/00;",
        ];
        let station = StationReader::new().parse_header(&lines).unwrap();

        assert_eq!(station.name, "PORTO ALEGRE");
        assert_eq!(station.wmo_code, "A801");
        assert_eq!(station.altitude, None);
        assert_eq!(
            station.founding_date,
            NaiveDate::from_ymd_opt(2000, 9, 22).unwrap()
        );
    }

    #[test]
    fn test_missing_separator_rejects_header() {
        let mut lines = legacy_header();
        lines[3] = "CODIGO (WMO) A001";

        let err = StationReader::new().parse_header(&lines).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingSeparator {
                line: 4,
                content: "CODIGO (WMO) A001".to_string()
            }
        );
    }

    #[test]
    fn test_missing_line_rejects_header() {
        let lines = &legacy_header()[..6];
        let err = StationReader::new().parse_header(lines).unwrap_err();
        assert_eq!(err, FormatError::MissingLine { line: 7 });
    }

    #[test]
    fn test_bad_founding_date_rejects_header() {
        let mut lines = legacy_header();
        lines[7] = "DATA DE FUNDACAO:;sometime";

        let err = StationReader::new().parse_header(&lines).unwrap_err();
        assert_eq!(err, FormatError::InvalidDate("sometime".to_string()));
    }

    #[test]
    fn test_read_station_reports_path() {
        let file = StationFile::from_text("broken.CSV", "REGIAO:;CO\n".to_string());
        let err = StationReader::new().read_station(&file).unwrap_err();

        match err {
            ProcessingError::Format { path, error } => {
                assert_eq!(path.to_str(), Some("broken.CSV"));
                assert_eq!(error, FormatError::MissingLine { line: 2 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

use crate::error::{FormatError, RowError};
use crate::models::{MeasurementRecord, Readings};
use crate::readers::dialect::ColumnLayout;
use crate::readers::source_file::StationFile;
use crate::readers::temporal::{parse_date, parse_time};
use crate::readers::values::normalize_value;
use csv::{StringRecord, StringRecordsIntoIter};

/// Reads the data rows that follow a station file's header block.
pub struct MeasurementReader;

impl MeasurementReader {
    pub fn new() -> Self {
        Self
    }

    /// Stream the rows of a file. Each item is one row, parsed or rejected.
    pub fn rows<'a>(&self, file: &'a StationFile) -> MeasurementRows<'a> {
        let dialect = file.dialect();
        let records = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_reader(file.body().as_bytes())
            .into_records();

        MeasurementRows {
            records,
            columns: dialect.columns,
            first_line: file.body_first_line(),
        }
    }

    /// Collect a whole file, keeping the rejected rows apart.
    pub fn read_all(&self, file: &StationFile) -> (Vec<MeasurementRecord>, Vec<RowError>) {
        let mut records = Vec::new();
        let mut rejected = Vec::new();

        for row in self.rows(file) {
            match row {
                Ok(record) => records.push(record),
                Err(e) => rejected.push(e),
            }
        }

        (records, rejected)
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy row iterator over one station file.
pub struct MeasurementRows<'a> {
    records: StringRecordsIntoIter<&'a [u8]>,
    columns: ColumnLayout,
    first_line: usize,
}

impl MeasurementRows<'_> {
    fn file_line(&self, body_line: Option<u64>) -> usize {
        body_line.map_or(0, |line| self.first_line + line as usize - 1)
    }
}

impl Iterator for MeasurementRows<'_> {
    type Item = Result<MeasurementRecord, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.records.next()? {
                Ok(record) => {
                    if record.iter().all(str::is_empty) {
                        continue;
                    }

                    let line = self.file_line(record.position().map(|p| p.line()));
                    return Some(
                        parse_row(&record, self.columns).map_err(|error| RowError { line, error }),
                    );
                }
                Err(e) => {
                    let line = self.file_line(e.position().map(|p| p.line()));
                    return Some(Err(RowError {
                        line,
                        error: FormatError::Decoding(e.to_string()),
                    }));
                }
            }
        }
    }
}

/// Map one row's cells onto a measurement by position.
pub fn parse_row(
    record: &StringRecord,
    columns: ColumnLayout,
) -> Result<MeasurementRecord, FormatError> {
    let required = columns.required_cells();
    if record.len() < required {
        return Err(FormatError::ColumnCount {
            expected: required,
            found: record.len(),
        });
    }

    if let Some((index, value)) = record
        .iter()
        .enumerate()
        .skip(required)
        .find(|(_, cell)| !cell.is_empty())
    {
        return Err(FormatError::UnexpectedCell {
            index,
            value: value.to_string(),
        });
    }

    let date = parse_date(&record[columns.date_cell()])?;
    let time = parse_time(&record[columns.time_cell()])?;

    let mut readings = Readings::new();
    for &(cell, reading) in columns.reading_cells() {
        readings.set(reading, normalize_value(&record[cell]));
    }

    Ok(MeasurementRecord::new(date, time, readings))
}

use crate::error::Result;
use crate::readers::dialect::{FileDialect, METADATA_LINES};
use encoding_rs::WINDOWS_1252;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A station file decoded into text, with its dialect already detected.
#[derive(Debug, Clone)]
pub struct StationFile {
    path: PathBuf,
    text: String,
    dialect: FileDialect,
}

impl StationFile {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_text(path, decode_bytes(&bytes)))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: String) -> Self {
        let dialect = {
            let leading: Vec<&str> = text.lines().take(METADATA_LINES + 1).collect();
            FileDialect::detect(&leading)
        };

        Self {
            path: path.into(),
            text,
            dialect,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> FileDialect {
        self.dialect
    }

    /// The metadata lines, fewer if the file is truncated.
    pub fn header_lines(&self) -> Vec<&str> {
        self.text.lines().take(METADATA_LINES).collect()
    }

    /// One-based line number of the first data row.
    pub fn body_first_line(&self) -> usize {
        self.dialect.header.skip_lines() + 1
    }

    /// Everything after the header block.
    pub fn body(&self) -> &str {
        let skip = self.dialect.header.skip_lines();
        let offset: usize = self
            .text
            .split_inclusive('\n')
            .take(skip)
            .map(str::len)
            .sum();
        &self.text[offset..]
    }
}

/// Station files are Latin-1 exports, but some have been re-saved as UTF-8.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::dialect::HeaderLayout;

    const HEADER: &str = "REGIAO:;CO\nUF:;DF\nESTACAO:;BRASILIA\nCODIGO (WMO):;A001\n\
                          LATITUDE:;-15,78944444\nLONGITUDE:;-47,92583332\nALTITUDE:;1160,96\n\
                          DATA DE FUNDACAO:;07/05/00\n";

    #[test]
    fn test_decode_latin1() {
        let bytes = b"REGI\xC3O:;CO";
        assert_eq!(decode_bytes(bytes), "REGIÃO:;CO");
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = "\u{FEFF}REGIÃO:;CO".as_bytes();
        assert_eq!(decode_bytes(bytes), "REGIÃO:;CO");
    }

    #[test]
    fn test_titled_body() {
        let text = format!("{HEADER}Data;Hora UTC;Chuva\n2019/01/01;0000 UTC;0\n");
        let file = StationFile::from_text("a.csv", text);

        assert_eq!(file.dialect().header, HeaderLayout::Titled);
        assert_eq!(file.body(), "2019/01/01;0000 UTC;0\n");
        assert_eq!(file.body_first_line(), 10);
        assert_eq!(file.header_lines().len(), 8);
    }

    #[test]
    fn test_bare_body_with_crlf() {
        let text = format!("{}2012-03-05;12:00;0\r\n", HEADER.replace('\n', "\r\n"));
        let file = StationFile::from_text("b.csv", text);

        assert_eq!(file.dialect().header, HeaderLayout::Bare);
        assert_eq!(file.body(), "2012-03-05;12:00;0\r\n");
        assert_eq!(file.body_first_line(), 9);
    }

    #[test]
    fn test_truncated_file_has_empty_body() {
        let file = StationFile::from_text("c.csv", "REGIAO:;CO\nUF:;DF\n".to_string());
        assert_eq!(file.body(), "");
        assert_eq!(file.header_lines().len(), 2);
    }
}

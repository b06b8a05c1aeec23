use crate::error::{ProcessingError, Result};
use crate::utils::constants::DATA_FILE_EXTENSION;
use crate::utils::filename::has_extension;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// A temporary directory holding the expanded contents of one archive.
///
/// The directory and everything in it is removed when the area is dropped,
/// whichever way the archive's processing ends.
pub struct ExtractionArea {
    temp_dir: TempDir,
    archive_path: PathBuf,
    extracted_entries: usize,
}

impl ExtractionArea {
    /// Expand every file entry of `zip_path` into a fresh temporary directory.
    pub fn extract(zip_path: &Path) -> Result<Self> {
        Self::extract_in(zip_path, None)
    }

    /// Like [`ExtractionArea::extract`], but create the area below `base`
    /// instead of the system temporary directory when one is given.
    ///
    /// Any failure is reported as [`ProcessingError::Archive`]: nothing from
    /// the archive can be loaded, but other archives are unaffected.
    pub fn extract_in(zip_path: &Path, base: Option<&Path>) -> Result<Self> {
        let archive_error = |reason: String| ProcessingError::Archive {
            path: zip_path.to_path_buf(),
            reason,
        };

        let temp_dir = match base {
            Some(base) => TempDir::new_in(base),
            None => TempDir::new(),
        }
        .map_err(|e| archive_error(format!("Failed to create temporary directory: {}", e)))?;

        let mut area = Self {
            temp_dir,
            archive_path: zip_path.to_path_buf(),
            extracted_entries: 0,
        };
        area.extracted_entries = area.extract_entries().map_err(|e| match e {
            ProcessingError::Zip(zip_err) => archive_error(zip_err.to_string()),
            ProcessingError::Io(io_err) => archive_error(io_err.to_string()),
            other => other,
        })?;

        debug!(
            "Extracted {} entries from {} into {}",
            area.extracted_entries,
            zip_path.display(),
            area.temp_dir.path().display()
        );

        Ok(area)
    }

    fn extract_entries(&self) -> Result<usize> {
        let file = File::open(&self.archive_path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut extracted = 0;

        for i in 0..archive.len() {
            let mut zip_file = archive.by_index(i)?;

            // Entry names that would land outside the area are dropped
            let relative = match zip_file.enclosed_name() {
                Some(name) => name.to_path_buf(),
                None => {
                    warn!(
                        "Skipping unsafe entry '{}' in {}",
                        zip_file.name(),
                        self.archive_path.display()
                    );
                    continue;
                }
            };

            let dest_path = self.temp_dir.path().join(relative);

            if zip_file.is_dir() {
                std::fs::create_dir_all(&dest_path)?;
                continue;
            }

            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let dest_file = File::create(&dest_path)?;
            let mut writer = BufWriter::new(dest_file);
            std::io::copy(&mut zip_file, &mut writer)?;
            writer.flush()?;
            extracted += 1;
        }

        Ok(extracted)
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn extracted_entries(&self) -> usize {
        self.extracted_entries
    }

    /// Station data files anywhere below the extraction root, in path order.
    pub fn data_files(&self) -> Vec<PathBuf> {
        find_data_files(self.temp_dir.path())
    }

    /// Remove the area now and report failures, instead of on drop.
    pub fn close(self) -> Result<()> {
        self.temp_dir.close()?;
        Ok(())
    }
}

/// Recursively collect `*.csv` files (any case) below `root`.
pub fn find_data_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, DATA_FILE_EXTENSION))
        .collect();

    files.sort();
    files
}

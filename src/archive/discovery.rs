use crate::error::{ProcessingError, Result};
use crate::utils::constants::{ARCHIVE_EXTENSION, DATA_FILE_EXTENSION};
use crate::utils::filename::{display_name, has_extension, matches_pattern};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One unit of ingestion work found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Source {
    /// A ZIP archive to be expanded.
    Archive(PathBuf),
    /// Station files lying directly in the input directory.
    Directory { path: PathBuf, files: Vec<PathBuf> },
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Source::Archive(path) => path,
            Source::Directory { path, .. } => path,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Source::Archive(path) => display_name(path),
            Source::Directory { path, files } => {
                format!("{} ({} loose files)", path.display(), files.len())
            }
        }
    }
}

/// Everything `discover_sources` found, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceInventory {
    pub sources: Vec<Source>,
}

impl SourceInventory {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn archive_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s, Source::Archive(_)))
            .count()
    }

    pub fn loose_file_count(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s {
                Source::Directory { files, .. } => files.len(),
                Source::Archive(_) => 0,
            })
            .sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} archives, {} loose station files",
            self.archive_count(),
            self.loose_file_count()
        )
    }
}

/// Scan `dir` (not its subdirectories) for archives and loose station files.
///
/// Finding nothing is not an error; the caller gets an empty inventory.
pub fn discover_sources(dir: &Path, file_pattern: &str) -> Result<SourceInventory> {
    if !dir.is_dir() {
        return Err(ProcessingError::InvalidInput(format!(
            "Path is not a directory: {}",
            dir.display()
        )));
    }

    let mut archives = Vec::new();
    let mut loose_files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if !path.is_file() || !matches_pattern(&path, file_pattern) {
            continue;
        }

        if has_extension(&path, ARCHIVE_EXTENSION) {
            archives.push(path);
        } else if has_extension(&path, DATA_FILE_EXTENSION) {
            loose_files.push(path);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    // Sort by filename for consistent processing order
    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    loose_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut sources: Vec<Source> = archives.into_iter().map(Source::Archive).collect();
    if !loose_files.is_empty() {
        sources.push(Source::Directory {
            path: dir.to_path_buf(),
            files: loose_files,
        });
    }

    let inventory = SourceInventory { sources };
    info!("Found {} in {}", inventory.summary(), dir.display());

    Ok(inventory)
}

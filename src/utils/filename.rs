use std::path::Path;

/// Case-insensitive extension check; INMET ships both `.CSV` and `.csv`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Substring filter on the file name. An empty pattern matches everything.
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.contains(pattern))
}

/// File name for log lines and reports, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

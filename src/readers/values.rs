use crate::utils::constants::MISSING_SENTINEL;

/// Turn a decimal-comma token into a reading.
///
/// Empty, unparsable and sentinel tokens all come back as `None`; a bad cell
/// is data, not an error.
///
/// # Examples
/// ```
/// use inmet_processor::readers::normalize_value;
///
/// assert_eq!(normalize_value("1160,96"), Some(1160.96));
/// assert_eq!(normalize_value("-9999"), None);
/// assert_eq!(normalize_value(""), None);
/// ```
pub fn normalize_value(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let value = token.replace(',', ".").parse::<f64>().ok()?;

    if !value.is_finite() || value == MISSING_SENTINEL {
        None
    } else {
        Some(value)
    }
}

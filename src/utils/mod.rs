pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{display_name, has_extension, matches_pattern};
pub use progress::ProgressReporter;

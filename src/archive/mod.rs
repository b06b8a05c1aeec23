pub mod discovery;
pub mod temp_manager;

pub use discovery::{discover_sources, Source, SourceInventory};
pub use temp_manager::{find_data_files, ExtractionArea};

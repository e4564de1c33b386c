//! High-level lenses over the geolocation client
//!
//! - `report`: pure response transformer (raw JSON -> categorized report)
//! - `lookup`: lookup operations plus output rendering
//! - `export`: one-shot JSON/text file export
//! - `utils`: shared output-format type

pub mod export;
pub mod lookup;
pub mod report;
pub mod utils;

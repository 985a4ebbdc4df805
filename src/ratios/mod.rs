pub mod csv_loader;
pub mod models;
pub mod snapshot;
pub mod table;

pub use models::{DataSourceMode, RatioRecord, Variant};
pub use snapshot::RaceDataSnapshot;

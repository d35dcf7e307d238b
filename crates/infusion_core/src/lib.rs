//! Core domain logic for the infusion site tracker.
//! This crate owns point lifecycle rules and the persisted file format.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::point::{
    parse_duration_weeks, InvalidDurationError, Point, PointId, Position, MAX_EXPIRY_YEAR,
};
pub use repo::point_file::{
    CsvPointRepository, LoadedSnapshot, MalformedRowError, PersistenceFormatError,
    PointRepository, RepoError, RepoResult, SaveReport,
};
pub use service::clock::{Clock, ManualClock, SystemClock};
pub use service::point_store::{LoadReport, PointStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

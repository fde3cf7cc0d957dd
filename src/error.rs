use alloc::string::String;

use thiserror::Error;

use crate::phase::Category;

/// Errors produced by the lighting engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller-supplied data was rejected. No state was changed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Phase or window cannot be evaluated
    #[error("invalid phase {start_hour}h..{end_hour}h: {reason}")]
    InvalidPhase {
        start_hour: u8,
        end_hour: u8,
        reason: &'static str,
    },
    #[error("invalid clock reading {hour:02}:{minute:02}")]
    InvalidClock { hour: u8, minute: u8 },
    /// No phase of an interpolated category covers this hour
    #[error("no {category} phase covers hour {hour}")]
    UncoveredHour { category: Category, hour: u8 },
    #[error("{category} phases overlap at hour {hour}")]
    OverlappingPhases { category: Category, hour: u8 },
    /// Category index sets do not partition the fixture range
    #[error("invalid fixture layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by a [`ConfigStorage`](crate::storage::ConfigStorage)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("no stored config")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("config encoding failed: {0}")]
    Encoding(String),
}

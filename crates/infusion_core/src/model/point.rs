//! Point domain model.
//!
//! # Responsibility
//! - Define the canonical infusion-site record and its pixel position.
//! - Parse the weeks-to-expiry input entered by the operator.
//!
//! # Invariants
//! - `id` is stable and never reused for another point.
//! - `position` never changes after creation.
//! - A point is expired at `t` only when `expires_at < t` (strict).

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Latest expiry year that still fits the four-digit `MM/DD/YYYY` file format.
pub const MAX_EXPIRY_YEAR: i32 = 9999;

/// Stable identifier for a point for the lifetime of one in-memory session.
///
/// Not persisted: the file format only carries the display number.
pub type PointId = Uuid;

/// Integer pixel coordinates on the body diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance. Saturates at `u64::MAX`.
    pub fn distance_squared(&self, other: Position) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One marked infusion site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Stable internal identity, independent of renumbering.
    pub id: PointId,
    /// 1-based display rank. Reassigned on every structural change.
    pub number: u32,
    pub position: Position,
    /// Local wall-clock instant after which the site is discarded.
    pub expires_at: NaiveDateTime,
}

impl Point {
    /// Creates a point with a generated stable ID.
    pub fn new(number: u32, position: Position, expires_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            position,
            expires_at,
        }
    }

    /// Creates a point expiring `weeks` after `now`.
    ///
    /// # Errors
    /// - Returns `InvalidDurationError::OutOfRange` when the expiry timestamp
    ///   cannot be represented or falls after `MAX_EXPIRY_YEAR`.
    pub fn expiring_in_weeks(
        number: u32,
        position: Position,
        now: NaiveDateTime,
        weeks: u32,
    ) -> Result<Self, InvalidDurationError> {
        let expires_at = TimeDelta::try_weeks(i64::from(weeks))
            .and_then(|delta| now.checked_add_signed(delta))
            .filter(|expires_at| expires_at.year() <= MAX_EXPIRY_YEAR)
            .ok_or(InvalidDurationError::OutOfRange(weeks.to_string()))?;
        Ok(Self::new(number, position, expires_at))
    }

    /// Returns whether this point must be discarded by a sweep at `at_time`.
    pub fn is_expired_at(&self, at_time: NaiveDateTime) -> bool {
        self.expires_at < at_time
    }
}

/// Rejected weeks-to-expiry input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidDurationError {
    /// Input was empty or whitespace only.
    Empty,
    /// Input is not a non-negative base-10 integer.
    NotANumber(String),
    /// Input is numeric but too large to produce a valid timestamp.
    OutOfRange(String),
}

impl Display for InvalidDurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "please enter a number of weeks"),
            Self::NotANumber(value) => {
                write!(f, "`{value}` is not a valid number of weeks")
            }
            Self::OutOfRange(value) => write!(f, "{value} weeks is too far in the future"),
        }
    }
}

impl Error for InvalidDurationError {}

/// Parses operator input into a non-negative number of weeks.
///
/// Surrounding whitespace is ignored. Signs, decimals and separators are
/// rejected, so `-1`, `+2` and `1.5` all fail.
pub fn parse_duration_weeks(input: &str) -> Result<u32, InvalidDurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidDurationError::Empty);
    }
    if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(InvalidDurationError::NotANumber(trimmed.to_string()));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| InvalidDurationError::OutOfRange(trimmed.to_string()))
}

//! Point snapshot repository backed by a delimited text file.
//!
//! # Responsibility
//! - Read and write the `Point Number,X,Y,Expiration Date` file.
//! - Keep a single backup copy of the file as it was before each save.
//!
//! # Invariants
//! - Columns are resolved by header name, not by position.
//! - Malformed rows are skipped and logged, never surfaced to callers.
//! - A save never deletes the backup unless it replaces it with a fresh copy.
//! - Expiration dates are stored without time; reads yield local midnight.

use crate::config::StoreConfig;
use crate::model::point::{Point, Position};
use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const COLUMN_NUMBER: &str = "Point Number";
pub const COLUMN_X: &str = "X";
pub const COLUMN_Y: &str = "Y";
pub const COLUMN_EXPIRATION: &str = "Expiration Date";
pub const HEADER: [&str; 4] = [COLUMN_NUMBER, COLUMN_X, COLUMN_Y, COLUMN_EXPIRATION];

/// `MM/DD/YYYY`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub type RepoResult<T> = Result<T, RepoError>;

/// The file exists but cannot be read as a point table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceFormatError {
    /// The file has no header row at all.
    MissingHeader,
    /// The header row lacks a required column.
    MissingColumn(&'static str),
}

impl Display for PersistenceFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "missing header row"),
            Self::MissingColumn(column) => write!(f, "header row lacks column `{column}`"),
        }
    }
}

impl Error for PersistenceFormatError {}

/// One row that was skipped during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRowError {
    /// Row could not be split into the header's columns.
    Unreadable(String),
    /// `Point Number` is not a non-negative integer.
    InvalidNumber(String),
    InvalidCoordinate { column: &'static str, value: String },
    InvalidDate(String),
}

impl Display for MalformedRowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(details) => write!(f, "unreadable row: {details}"),
            Self::InvalidNumber(value) => write!(f, "invalid point number `{value}`"),
            Self::InvalidCoordinate { column, value } => {
                write!(f, "invalid {column} coordinate `{value}`")
            }
            Self::InvalidDate(value) => write!(f, "invalid expiration date `{value}`"),
        }
    }
}

impl Error for MalformedRowError {}

/// Repository error for snapshot load/save.
#[derive(Debug)]
pub enum RepoError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    Format {
        path: PathBuf,
        source: PersistenceFormatError,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Format { path, source } => {
                write!(f, "{}: unusable point file: {source}", path.display())
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Format { source, .. } => Some(source),
        }
    }
}

/// Result of reading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedSnapshot {
    /// Valid rows in file order, numbered as persisted.
    pub points: Vec<Point>,
    /// Rows dropped as malformed.
    pub skipped_rows: usize,
    /// The file did not exist and was created with a header only.
    pub created: bool,
}

/// Result of writing a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub written: usize,
    /// A pre-existing data file was copied to the backup path.
    pub backup_created: bool,
}

/// Snapshot persistence contract used by the point store.
pub trait PointRepository {
    fn load_snapshot(&self) -> RepoResult<LoadedSnapshot>;
    fn save_snapshot(&self, points: &[Point]) -> RepoResult<SaveReport>;
}

#[derive(Debug, Deserialize)]
struct RawPointRow {
    #[serde(rename = "Point Number")]
    number: String,
    #[serde(rename = "X")]
    x: String,
    #[serde(rename = "Y")]
    y: String,
    #[serde(rename = "Expiration Date")]
    expiration_date: String,
}

#[derive(Debug, Serialize)]
struct PointRow {
    number: u32,
    x: i32,
    y: i32,
    expiration_date: String,
}

impl From<&Point> for PointRow {
    fn from(point: &Point) -> Self {
        Self {
            number: point.number,
            x: point.position.x,
            y: point.position.y,
            expiration_date: point.expires_at.format(DATE_FORMAT).to_string(),
        }
    }
}

/// File-backed repository with a fixed sibling backup.
#[derive(Debug, Clone)]
pub struct CsvPointRepository {
    data_path: PathBuf,
    backup_path: PathBuf,
}

impl CsvPointRepository {
    pub fn new(data_path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.data_path(), config.backup_path())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    fn read_existing(&self) -> RepoResult<LoadedSnapshot> {
        let path = self.data_path.as_path();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|source| csv_error(path, source))?;

        let headers = reader
            .headers()
            .map_err(|source| header_error(path, source))?
            .clone();
        validate_headers(&headers).map_err(|source| RepoError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let mut snapshot = LoadedSnapshot::default();
        for (index, record) in reader.records().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let parsed = record
                .map_err(|err| MalformedRowError::Unreadable(err.to_string()))
                .and_then(|record| parse_record(&record, &headers));
            match parsed {
                Ok(point) => snapshot.points.push(point),
                Err(err) => {
                    snapshot.skipped_rows += 1;
                    warn!(
                        "event=points_row_skip module=repo status=skipped line={} reason={}",
                        line, err
                    );
                }
            }
        }
        Ok(snapshot)
    }
}

impl PointRepository for CsvPointRepository {
    fn load_snapshot(&self) -> RepoResult<LoadedSnapshot> {
        let started_at = Instant::now();
        info!("event=points_load module=repo status=start");

        if !self.data_path.is_file() {
            write_table(&self.data_path, &[])?;
            info!(
                "event=points_load module=repo status=ok created=true rows=0 duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(LoadedSnapshot {
                created: true,
                ..LoadedSnapshot::default()
            });
        }

        match self.read_existing() {
            Ok(snapshot) => {
                info!(
                    "event=points_load module=repo status=ok created=false rows={} skipped={} duration_ms={}",
                    snapshot.points.len(),
                    snapshot.skipped_rows,
                    started_at.elapsed().as_millis()
                );
                Ok(snapshot)
            }
            Err(err) => {
                error!(
                    "event=points_load module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn save_snapshot(&self, points: &[Point]) -> RepoResult<SaveReport> {
        let started_at = Instant::now();

        let backup_created = if self.data_path.is_file() {
            std::fs::copy(&self.data_path, &self.backup_path).map_err(|source| {
                error!(
                    "event=points_backup module=repo status=error error_code=backup_copy_failed error={}",
                    source
                );
                RepoError::Io {
                    path: self.backup_path.clone(),
                    source,
                }
            })?;
            true
        } else {
            false
        };

        if let Err(err) = write_table(&self.data_path, points) {
            error!(
                "event=points_save module=repo status=error backup_created={} duration_ms={} error={}",
                backup_created,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        info!(
            "event=points_save module=repo status=ok rows={} backup_created={} duration_ms={}",
            points.len(),
            backup_created,
            started_at.elapsed().as_millis()
        );
        Ok(SaveReport {
            written: points.len(),
            backup_created,
        })
    }
}

fn write_table(path: &Path, points: &[Point]) -> RepoResult<()> {
    // Header is written by hand so an empty table still gets one.
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;
    writer
        .write_record(HEADER)
        .map_err(|source| csv_error(path, source))?;
    for point in points {
        writer
            .serialize(PointRow::from(point))
            .map_err(|source| csv_error(path, source))?;
    }
    writer.flush().map_err(|source| RepoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_headers(headers: &StringRecord) -> Result<(), PersistenceFormatError> {
    if headers.iter().all(str::is_empty) {
        return Err(PersistenceFormatError::MissingHeader);
    }
    for column in HEADER {
        if !headers.iter().any(|name| name == column) {
            return Err(PersistenceFormatError::MissingColumn(column));
        }
    }
    Ok(())
}

fn parse_record(record: &StringRecord, headers: &StringRecord) -> Result<Point, MalformedRowError> {
    let raw: RawPointRow = record
        .deserialize(Some(headers))
        .map_err(|err| MalformedRowError::Unreadable(err.to_string()))?;
    parse_row(raw)
}

fn parse_row(raw: RawPointRow) -> Result<Point, MalformedRowError> {
    if raw.number.is_empty() || !raw.number.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(MalformedRowError::InvalidNumber(raw.number));
    }
    // Any digit string is a valid number; the store renumbers on load.
    let number = raw.number.parse::<u32>().unwrap_or(u32::MAX);
    let x = parse_coordinate(COLUMN_X, &raw.x)?;
    let y = parse_coordinate(COLUMN_Y, &raw.y)?;
    let expires_at = NaiveDate::parse_from_str(&raw.expiration_date, DATE_FORMAT)
        .map_err(|_| MalformedRowError::InvalidDate(raw.expiration_date.clone()))?
        .and_time(NaiveTime::MIN);

    Ok(Point::new(number, Position::new(x, y), expires_at))
}

fn parse_coordinate(column: &'static str, value: &str) -> Result<i32, MalformedRowError> {
    value
        .parse::<i32>()
        .map_err(|_| MalformedRowError::InvalidCoordinate {
            column,
            value: value.to_string(),
        })
}

fn header_error(path: &Path, source: csv::Error) -> RepoError {
    match source.kind() {
        csv::ErrorKind::Utf8 { .. } => RepoError::Format {
            path: path.to_path_buf(),
            source: PersistenceFormatError::MissingHeader,
        },
        _ => csv_error(path, source),
    }
}

fn csv_error(path: &Path, source: csv::Error) -> RepoError {
    RepoError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

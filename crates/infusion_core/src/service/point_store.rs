//! Point store: the in-memory ordered sequence of infusion sites.
//!
//! # Responsibility
//! - Add, remove and expire points, keeping display numbers contiguous.
//! - Move whole snapshots to and from a `PointRepository`.
//!
//! # Invariants
//! - After every public mutation, numbers are exactly `1..=len` in order.
//! - Expiry is strict: a point expiring exactly at the sweep instant survives.
//! - Expiry is lazy. Only `add*`, `load` and explicit sweeps remove points.
//! - A failed operation leaves the sequence unchanged.

use crate::model::point::{parse_duration_weeks, InvalidDurationError, Point, Position};
use crate::repo::point_file::{PointRepository, RepoResult, SaveReport};
use crate::service::clock::{Clock, SystemClock};
use chrono::NaiveDateTime;
use log::{debug, info};

/// Outcome of replacing the store contents from a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Points kept after the post-load sweep.
    pub loaded: usize,
    /// Rows dropped as malformed by the repository.
    pub skipped_rows: usize,
    /// Points discarded by the post-load sweep, numbered as loaded.
    pub expired: Vec<Point>,
    /// The backing file was missing and has been created empty.
    pub created: bool,
}

/// Single-owner store for annotated points.
#[derive(Debug)]
pub struct PointStore<C: Clock = SystemClock> {
    points: Vec<Point>,
    clock: C,
}

impl Default for PointStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl PointStore<SystemClock> {
    /// Creates an empty store reading the host clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> PointStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            points: Vec::new(),
            clock,
        }
    }

    /// Points in display order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Looks up a point by its current display number.
    pub fn get(&self, number: u32) -> Option<&Point> {
        self.points.iter().find(|point| point.number == number)
    }

    /// Adds a point from raw operator input for the weeks-to-expiry field.
    ///
    /// # Errors
    /// - Returns `InvalidDurationError` when `duration_input` is not a
    ///   non-negative integer or overflows the timestamp range. The store is
    ///   left unchanged.
    pub fn add(
        &mut self,
        position: Position,
        duration_input: &str,
    ) -> Result<Point, InvalidDurationError> {
        let weeks = parse_duration_weeks(duration_input)?;
        self.add_weeks(position, weeks)
    }

    /// Adds a point expiring `weeks` from now, then sweeps at the same instant.
    ///
    /// Returns the added point carrying its number after the sweep.
    pub fn add_weeks(
        &mut self,
        position: Position,
        weeks: u32,
    ) -> Result<Point, InvalidDurationError> {
        let now = self.clock.now();
        let point = Point::expiring_in_weeks(self.next_number(), position, now, weeks)?;
        let mut added = point.clone();
        self.points.push(point);

        self.sweep_expired(now);
        debug_assert_eq!(self.points.last().map(|last| last.id), Some(added.id));
        added.number = self.next_number() - 1;

        info!(
            "event=point_add module=store status=ok weeks={} count={}",
            weeks,
            self.points.len()
        );
        Ok(added)
    }

    /// Removes the point currently displayed as `number`.
    ///
    /// Resolving a click to a number is the caller's job; see `nearest`.
    pub fn remove_nearest(&mut self, number: u32) -> bool {
        let before = self.points.len();
        self.points.retain(|point| point.number != number);
        let removed = self.points.len() != before;
        if removed {
            self.renumber();
        }
        info!(
            "event=point_remove module=store status={} count={}",
            if removed { "ok" } else { "not_found" },
            self.points.len()
        );
        removed
    }

    /// Finds the point closest to `position` within `max_distance` pixels.
    ///
    /// Ties resolve to the earliest point in display order.
    pub fn nearest(&self, position: Position, max_distance: u32) -> Option<&Point> {
        let limit = u64::from(max_distance) * u64::from(max_distance);
        self.points
            .iter()
            .map(|point| (point.position.distance_squared(position), point))
            .filter(|(distance, _)| *distance <= limit)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, point)| point)
    }

    /// Removes every point with `expires_at < at_time`.
    ///
    /// Returned points keep the numbers they had before the sweep so callers
    /// can clear markers drawn under those numbers.
    pub fn sweep_expired(&mut self, at_time: NaiveDateTime) -> Vec<Point> {
        let (expired, kept): (Vec<Point>, Vec<Point>) = std::mem::take(&mut self.points)
            .into_iter()
            .partition(|point| point.is_expired_at(at_time));
        self.points = kept;
        self.renumber();

        if !expired.is_empty() {
            info!(
                "event=point_sweep module=store status=ok expired={} count={}",
                expired.len(),
                self.points.len()
            );
        }
        expired
    }

    /// Sweeps against the store clock.
    pub fn sweep_now(&mut self) -> Vec<Point> {
        let now = self.clock.now();
        self.sweep_expired(now)
    }

    /// Reassigns display numbers to match sequence order.
    pub fn renumber(&mut self) {
        for (index, point) in self.points.iter_mut().enumerate() {
            point.number = index as u32 + 1;
        }
    }

    /// Replaces the sequence with the repository snapshot, then sweeps.
    ///
    /// # Errors
    /// - Propagates repository errors; the sequence is untouched on error.
    pub fn load<R: PointRepository>(&mut self, repo: &R) -> RepoResult<LoadReport> {
        let snapshot = repo.load_snapshot()?;
        self.points = snapshot.points;
        self.renumber();
        let expired = self.sweep_now();

        debug!(
            "event=store_load module=store status=ok loaded={} expired={} skipped={}",
            self.points.len(),
            expired.len(),
            snapshot.skipped_rows
        );
        Ok(LoadReport {
            loaded: self.points.len(),
            skipped_rows: snapshot.skipped_rows,
            expired,
            created: snapshot.created,
        })
    }

    /// Writes the full sequence, backing up any previous file first.
    pub fn save<R: PointRepository>(&self, repo: &R) -> RepoResult<SaveReport> {
        repo.save_snapshot(&self.points)
    }

    fn next_number(&self) -> u32 {
        self.points.len() as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::PointStore;
    use crate::model::point::Position;
    use crate::service::clock::ManualClock;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn renumber_restores_contiguous_ranks() {
        let mut store = PointStore::with_clock(ManualClock::new(noon()));
        for x in 0..4 {
            store.add_weeks(Position::new(x, x), 1).unwrap();
        }
        store.points[0].number = 9;
        store.points[2].number = 9;

        store.renumber();

        let numbers: Vec<u32> = store.points().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn add_returns_number_after_sweep() {
        let clock = ManualClock::new(noon());
        let mut store = PointStore::with_clock(&clock);
        store.add_weeks(Position::new(1, 1), 0).unwrap();
        store.add_weeks(Position::new(2, 2), 3).unwrap();

        clock.set(noon() + TimeDelta::seconds(1));
        let added = store.add_weeks(Position::new(3, 3), 1).unwrap();

        assert_eq!(added.number, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2).map(|p| p.id), Some(added.id));
    }

    #[test]
    fn nearest_respects_radius_and_prefers_earliest_on_tie() {
        let mut store = PointStore::with_clock(ManualClock::new(noon()));
        store.add_weeks(Position::new(10, 0), 1).unwrap();
        store.add_weeks(Position::new(-10, 0), 1).unwrap();

        let hit = store.nearest(Position::new(0, 0), 10).unwrap();
        assert_eq!(hit.number, 1);
        assert!(store.nearest(Position::new(0, 0), 9).is_none());
    }
}

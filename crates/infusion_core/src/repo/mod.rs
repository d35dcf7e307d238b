//! Repository layer for point snapshots.
//!
//! # Responsibility
//! - Define the snapshot contract the point store persists through.
//! - Keep file format details out of the store.
//!
//! # Invariants
//! - Repositories only ever see a snapshot slice; they never own store state.
//! - Row-level damage is tolerated; container-level damage is an error.

pub mod point_file;

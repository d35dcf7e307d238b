//! Domain model for annotated infusion sites.
//!
//! # Responsibility
//! - Define the point record owned by the point store.
//! - Validate caller input that becomes part of a point.
//!
//! # Invariants
//! - Every point carries a stable `PointId` distinct from its display number.
//! - Display numbers are derived state and are reassigned by the store.

pub mod point;

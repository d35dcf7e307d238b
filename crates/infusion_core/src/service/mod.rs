//! Core use-case services.
//!
//! # Responsibility
//! - Own the in-memory point sequence and its lifecycle rules.
//! - Keep shell callers decoupled from file format details.

pub mod clock;
pub mod point_store;

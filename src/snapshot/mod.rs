// src/snapshot/mod.rs

//! Interactive review of failing snapshot assertions.

pub mod review;

pub use review::{ReviewAction, SnapshotReviewController};

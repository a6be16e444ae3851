//! Core domain types for Cadence.

pub mod common;
pub mod queue;
pub mod track;

pub use common::*;
pub use queue::PlayQueue;
pub use track::{HistoryKey, MediaKind, Track};

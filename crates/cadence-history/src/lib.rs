//! # cadence-history
//!
//! Listening history for Cadence.
//!
//! This crate provides:
//! - [`HttpHistory`]: the history API client (resume, save, list, delete)
//! - [`MemoryHistory`]: an in-process store for offline or anonymous sessions
//! - [`records`]: mapping of backend song/episode records onto [`cadence_core::Track`]

pub mod client;
pub mod config;
pub mod memory;
pub mod records;
pub mod types;

pub use client::HttpHistory;
pub use config::HistoryConfig;
pub use memory::{HistoryRecord, MemoryHistory};
pub use records::TrackRecord;
pub use types::HistoryEntry;

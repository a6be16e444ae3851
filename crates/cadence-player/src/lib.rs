//! # cadence-player
//!
//! Playback and queue engine for Cadence.
//!
//! Features:
//! - Single authoritative playback state with linear next/previous navigation
//! - Debounced position persistence to a history store
//! - Best-effort resume from the last saved position
//! - Channel-backed media sink for hosts that own the actual audio element

pub mod config;
pub mod engine;
mod persist;
pub mod sink;
pub mod state;

pub use config::PlayerConfig;
pub use engine::PlaybackEngine;
pub use sink::{CommandSink, SinkCommand};
pub use state::PlaybackState;

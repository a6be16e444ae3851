//! # cadence-core
//!
//! Core types, collaborator traits, and error handling for the Cadence
//! music and podcast player.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, HttpError, Result};
pub use traits::{HistoryStore, MediaSink, SinkEvent};
pub use types::*;

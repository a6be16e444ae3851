//! History backend selection.

use cadence_core::{HistoryKey, HistoryStore, Result};
use cadence_history::{HttpHistory, MemoryHistory};
use tracing::info;

use crate::config::AppConfig;

/// One row of the recently-played list, from either backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Recent {
    /// Backend handle used by [`History::forget`].
    pub id: String,
    pub key: HistoryKey,
    /// Display name, when the backend knows it.
    pub title: Option<String>,
    pub position: f64,
    pub play_count: u32,
}

/// The history store the session runs against.
#[derive(Clone)]
pub enum History {
    /// The listening-history API.
    Remote(HttpHistory),
    /// Positions kept for this session only.
    Local(MemoryHistory),
}

impl History {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.history()? {
            Some(history) => {
                info!("Using history API at {}", history.base_url);
                Ok(Self::Remote(HttpHistory::new(history)?))
            }
            None => {
                info!("No history API configured, keeping history in memory");
                Ok(Self::Local(MemoryHistory::new()))
            }
        }
    }
}

impl History {
    /// Most recently played items, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Recent>> {
        let recent = match self {
            Self::Remote(history) => history
                .recent(limit)
                .await?
                .into_iter()
                .map(|entry| Recent {
                    id: entry.id,
                    key: entry.track.history_key(),
                    title: Some(entry.track.display_name()),
                    position: entry.last_position,
                    play_count: entry.play_count,
                })
                .collect(),
            Self::Local(history) => history
                .recent(limit)
                .into_iter()
                .map(|record| Recent {
                    id: record.key.to_string(),
                    key: record.key,
                    title: None,
                    position: record.last_position as f64,
                    play_count: record.play_count,
                })
                .collect(),
        };
        Ok(recent)
    }

    /// Drop one row from the listening history.
    pub async fn forget(&self, entry: &Recent) -> Result<()> {
        match self {
            Self::Remote(history) => history.delete(&entry.id).await,
            Self::Local(history) => {
                history.remove(&entry.key);
                Ok(())
            }
        }
    }
}

impl HistoryStore for History {
    async fn resume_position(&self, key: &HistoryKey) -> Result<Option<f64>> {
        match self {
            Self::Remote(history) => history.resume_position(key).await,
            Self::Local(history) => history.resume_position(key).await,
        }
    }

    async fn save_position(&self, key: &HistoryKey, position: f64) -> Result<()> {
        match self {
            Self::Remote(history) => history.save_position(key, position).await,
            Self::Local(history) => history.save_position(key, position).await,
        }
    }
}

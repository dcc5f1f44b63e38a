//! Channel record store abstractions with in-memory and JSON-file backends.
//!
//! A channel record holds the force-enable and force-disable lists consumed by
//! `switch-policy`. Records are created on first attach and replaced wholesale
//! on every successful switch batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switch_core::{current_unix_timestamp_ms, write_json_pretty_atomic};
use switch_policy::ChannelState;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

pub const CHANNEL_STORE_SCHEMA_VERSION: u32 = 1;
pub const CHANNEL_STORE_FILE_NAME: &str = "channels.json";

/// Result type for channel store operations.
pub type StoreResult<T> = Result<T, ChannelStoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum ChannelStoreError {
    #[error("channel id must not be empty")]
    InvalidChannelId,
    #[error(
        "unsupported channel store schema_version {found} in {} (expected {expected})",
        .path.display()
    )]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("channel store {} contains an empty channel key", .0.display())]
    EmptyChannelKey(PathBuf),
    #[error("failed to persist channel store {}: {message}", .path.display())]
    Persist { path: PathBuf, message: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Persisted per-channel switch record.
pub struct ChannelRecord {
    #[serde(default)]
    pub enable: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
    #[serde(default)]
    pub updated_unix_ms: u64,
}

impl ChannelRecord {
    pub fn state(&self) -> ChannelState {
        ChannelState::new(self.enable.clone(), self.disable.clone())
    }

    fn stamped(state: &ChannelState) -> Self {
        Self {
            enable: state.enable.clone(),
            disable: state.disable.clone(),
            updated_unix_ms: current_unix_timestamp_ms(),
        }
    }
}

/// Async store contract used by the switch runtime.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Returns the record for `channel_id`, or `None` when the channel was never attached.
    async fn load(&self, channel_id: &str) -> StoreResult<Option<ChannelRecord>>;

    /// Replaces the channel's lists; completes only once the write is durable.
    async fn save(&self, channel_id: &str, state: &ChannelState) -> StoreResult<ChannelRecord>;

    /// Loads the record, creating an empty one on first attach.
    async fn attach(&self, channel_id: &str) -> StoreResult<ChannelRecord> {
        if let Some(record) = self.load(channel_id).await? {
            return Ok(record);
        }
        debug!(channel_id, "creating channel record on first attach");
        self.save(channel_id, &ChannelState::default()).await
    }
}

fn normalize_channel_id(raw: &str) -> StoreResult<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChannelStoreError::InvalidChannelId);
    }
    Ok(trimmed)
}

/// In-memory implementation for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct InMemoryChannelStore {
    records: RwLock<BTreeMap<String, ChannelRecord>>,
}

impl InMemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelStore for InMemoryChannelStore {
    async fn load(&self, channel_id: &str) -> StoreResult<Option<ChannelRecord>> {
        let channel_id = normalize_channel_id(channel_id)?;
        Ok(self.records.read().await.get(channel_id).cloned())
    }

    async fn save(&self, channel_id: &str, state: &ChannelState) -> StoreResult<ChannelRecord> {
        let channel_id = normalize_channel_id(channel_id)?;
        let record = ChannelRecord::stamped(state);
        self.records
            .write()
            .await
            .insert(channel_id.to_string(), record.clone());
        Ok(record)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ChannelStoreFile {
    schema_version: u32,
    #[serde(default)]
    channels: BTreeMap<String, ChannelRecord>,
}

impl Default for ChannelStoreFile {
    fn default() -> Self {
        Self {
            schema_version: CHANNEL_STORE_SCHEMA_VERSION,
            channels: BTreeMap::new(),
        }
    }
}

pub fn channel_store_path_for_state_dir(state_dir: &Path) -> PathBuf {
    state_dir.join(CHANNEL_STORE_FILE_NAME)
}

/// Single-document JSON store; every save rewrites the file atomically.
#[derive(Debug)]
pub struct JsonFileChannelStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileChannelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn for_state_dir(state_dir: &Path) -> Self {
        Self::new(channel_store_path_for_state_dir(state_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> StoreResult<ChannelStoreFile> {
        if !self.path.exists() {
            return Ok(ChannelStoreFile::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let parsed = serde_json::from_str::<ChannelStoreFile>(&raw)?;
        if parsed.schema_version != CHANNEL_STORE_SCHEMA_VERSION {
            return Err(ChannelStoreError::UnsupportedSchema {
                path: self.path.clone(),
                found: parsed.schema_version,
                expected: CHANNEL_STORE_SCHEMA_VERSION,
            });
        }
        if parsed.channels.keys().any(|key| key.trim().is_empty()) {
            return Err(ChannelStoreError::EmptyChannelKey(self.path.clone()));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ChannelStore for JsonFileChannelStore {
    async fn load(&self, channel_id: &str) -> StoreResult<Option<ChannelRecord>> {
        let channel_id = normalize_channel_id(channel_id)?;
        let file = self.read_file()?;
        Ok(file.channels.get(channel_id).cloned())
    }

    async fn save(&self, channel_id: &str, state: &ChannelState) -> StoreResult<ChannelRecord> {
        let channel_id = normalize_channel_id(channel_id)?;
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file()?;
        let record = ChannelRecord::stamped(state);
        file.channels.insert(channel_id.to_string(), record.clone());
        write_json_pretty_atomic(&self.path, &file).map_err(|error| {
            ChannelStoreError::Persist {
                path: self.path.clone(),
                message: format!("{error:#}"),
            }
        })?;
        info!(
            channel_id,
            enable = record.enable.len(),
            disable = record.disable.len(),
            path = %self.path.display(),
            "persisted channel record"
        );
        Ok(record)
    }
}

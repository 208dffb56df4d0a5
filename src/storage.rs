use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::BoardState;

/// Name the persisted board record is stored under.
pub const STORAGE_KEY: &str = "task-flow-storage-v2";
pub const STORAGE_VERSION: u32 = 0;
pub const STORAGE_PATH_ENV: &str = "TASKFLOW_STORAGE_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct PersistedRecord {
    state: BoardState,
    version: u32,
}

/// Backend holding the single serialized board record.
pub trait StateStorage {
    /// Returns `Ok(None)` when nothing usable has been persisted yet.
    fn load(&self) -> Result<Option<BoardState>>;

    fn save(&mut self, state: &BoardState) -> Result<()>;

    /// Copies a record that could not be used aside before it gets
    /// overwritten. Returns where the copy went, if one was made.
    fn preserve_unreadable(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

impl<T: StateStorage + ?Sized> StateStorage for Box<T> {
    fn load(&self) -> Result<Option<BoardState>> {
        (**self).load()
    }

    fn save(&mut self, state: &BoardState) -> Result<()> {
        (**self).save(state)
    }

    fn preserve_unreadable(&self) -> Result<Option<PathBuf>> {
        (**self).preserve_unreadable()
    }
}

pub fn encode_record(state: &BoardState) -> Result<String> {
    let record = PersistedRecord {
        state: state.clone(),
        version: STORAGE_VERSION,
    };
    serde_json::to_string(&record).context("failed to serialize board state")
}

/// Parses a persisted record. A record written under another version is
/// treated as absent.
pub fn decode_record(contents: &str) -> Result<Option<BoardState>> {
    let record: PersistedRecord =
        serde_json::from_str(contents).context("failed to parse persisted board state")?;
    if record.version != STORAGE_VERSION {
        warn!(
            "persisted board state has version {} (expected {}); ignoring it",
            record.version, STORAGE_VERSION
        );
        return Ok(None);
    }
    Ok(Some(record.state))
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{STORAGE_KEY}.json")))
    }

    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("failed to determine local data directory"))?;
        Ok(data_dir.join("taskflow").join(format!("{STORAGE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<BoardState>> {
        if !self.path.exists() {
            debug!("no persisted board at {}", self.path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        decode_record(&contents)
            .with_context(|| format!("invalid board record in {}", self.path.display()))
    }

    fn save(&mut self, state: &BoardState) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("invalid storage path {}", self.path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create storage directory {}", parent.display()))?;

        let contents = encode_record(state)?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| anyhow!("invalid storage file name {}", self.path.display()))?
            .to_string_lossy()
            .to_string();
        let tmp_path = self.path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    fn preserve_unreadable(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).with_context(|| {
            format!(
                "failed to copy {} to {}",
                self.path.display(),
                backup.display()
            )
        })?;
        Ok(Some(backup))
    }
}

/// Keeps the record in memory as the serialized string.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    record: Option<String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: &BoardState) -> Result<Self> {
        Ok(Self {
            record: Some(encode_record(state)?),
            writes: 0,
        })
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<BoardState>> {
        match self.record.as_deref() {
            Some(contents) => decode_record(contents),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &BoardState) -> Result<()> {
        self.record = Some(encode_record(state)?);
        self.writes += 1;
        Ok(())
    }
}

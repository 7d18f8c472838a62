//! Append-only JSON-lines interaction log.
//!
//! Each line is one JSON-encoded [`InteractionRecord`]. Writes only ever
//! append; loads read the whole file into an immutable [`LogSnapshot`].
//!
//! A malformed line discards the entire load by default;
//! [`MalformedLinePolicy::SkipLine`] drops just that line instead.

use inferenceiq_core::error::StoreError;
use inferenceiq_core::record::{CANONICAL_FIELDS, InteractionRecord};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// What a load does when a line fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Substitute an empty snapshot for the whole file.
    #[default]
    DiscardAll,
    /// Drop only the offending line.
    SkipLine,
}

impl FromStr for MalformedLinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discard_all" => Ok(Self::DiscardAll),
            "skip_line" => Ok(Self::SkipLine),
            other => Err(format!("unknown malformed-line policy: {other}")),
        }
    }
}

/// Every record of one log load, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSnapshot {
    records: Vec<InteractionRecord>,
}

impl LogSnapshot {
    pub fn new(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// A snapshot with no records. It still exposes the canonical columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records in ingestion order.
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// The canonical field set, present even when the log is empty or absent.
    pub fn columns(&self) -> &'static [&'static str] {
        &CANONICAL_FIELDS
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads and appends JSONL interaction logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStore {
    policy: MalformedLinePolicy,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MalformedLinePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MalformedLinePolicy {
        self.policy
    }

    /// Load every record from `path`.
    ///
    /// A missing or unreadable file yields an empty snapshot, as does any
    /// malformed line under [`MalformedLinePolicy::DiscardAll`].
    pub fn load(&self, path: &Path) -> LogSnapshot {
        if !path.exists() {
            warn!(path = %path.display(), "Log file not found, using an empty snapshot");
            return LogSnapshot::empty();
        }
        match self.read(path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding log load");
                LogSnapshot::empty()
            }
        }
    }

    /// Like [`load`](Self::load), but a missing file is an error.
    pub fn load_required(&self, path: &Path) -> Result<LogSnapshot, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(self.load(path))
    }

    fn read(&self, path: &Path) -> Result<LogSnapshot, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let records = self.parse(&content)?;
        debug!(path = %path.display(), count = records.len(), "Interaction log loaded");
        Ok(LogSnapshot::new(records))
    }

    fn parse(&self, content: &str) -> Result<Vec<InteractionRecord>, StoreError> {
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InteractionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    let err = StoreError::Malformed {
                        line: idx + 1,
                        reason: e.to_string(),
                    };
                    match self.policy {
                        MalformedLinePolicy::DiscardAll => return Err(err),
                        MalformedLinePolicy::SkipLine => {
                            warn!(error = %err, "Skipping malformed log line");
                        }
                    }
                }
            }
        }
        Ok(records)
    }

    /// Append `records` to `path` in order, one JSON object per line.
    ///
    /// Parent directories are created as needed. An empty slice is a no-op
    /// that does not touch the filesystem. All lines are serialized before
    /// anything is written, so a serialization failure writes nothing.
    pub fn append(&self, path: &Path, records: &[InteractionRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }

        let io_err = |e: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        Ok(records.len())
    }
}

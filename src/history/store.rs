use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Sample;
use crate::error::{Error, Result};

const SCHEMA_NAME: &str = "steam-scout-history";
const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SchemaHeader {
    schema: String,
    version: u32,
}

impl SchemaHeader {
    fn current() -> Self {
        Self {
            schema: SCHEMA_NAME.to_string(),
            version: SCHEMA_VERSION,
        }
    }
}

/// Durable append-only sample log, shared across process invocations.
///
/// Layout: a single schema header line followed by one JSON record per line.
/// A header that does not match the current schema is treated as a legacy
/// store and reinitialized empty; that recovery is destructive but
/// deterministic, never a partial read.
///
/// Concurrent writers are not coordinated; an append race is last-writer-wins
/// at the file level. Runs are expected to be serialized by the scheduler.
pub struct HistoryStore {
    path: PathBuf,
    samples: Vec<Sample>,
}

impl HistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Self::initialize(path);
        }

        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("cannot open {}: {}", path.display(), e)))?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => {
                line.map_err(|e| Error::Storage(format!("cannot read {}: {}", path.display(), e)))?
            }
            // Zero-byte file, e.g. interrupted first run.
            None => return Self::initialize(path),
        };

        let header: Option<SchemaHeader> = serde_json::from_str(&header_line).ok();
        if header != Some(SchemaHeader::current()) {
            log::warn!(
                "history store {} has an unrecognized schema header; reinitializing empty",
                path.display()
            );
            return Self::initialize(path);
        }

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        for line in lines {
            let line = line
                .map_err(|e| Error::Storage(format!("cannot read {}: {}", path.display(), e)))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Sample>(&line) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    skipped += 1;
                    log::warn!("skipping unreadable history record: {}", e);
                }
            }
        }
        if skipped > 0 {
            log::warn!("history store loaded with {} unreadable records skipped", skipped);
        }
        log::debug!("history store loaded: {} samples", samples.len());

        Ok(Self { path, samples })
    }

    fn initialize(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        let mut file = File::create(&path)
            .map_err(|e| Error::Storage(format!("cannot create {}: {}", path.display(), e)))?;
        let header = serde_json::to_string(&SchemaHeader::current())
            .map_err(|e| Error::Storage(format!("cannot encode schema header: {}", e)))?;
        writeln!(file, "{}", header)
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            samples: Vec::new(),
        })
    }

    /// Appends samples durably. All-or-nothing per batch: any invalid sample
    /// fails the call before the file is touched. Duplicate
    /// (app_id, timestamp) pairs are permitted and both retained.
    pub fn append(&mut self, samples: &[Sample]) -> Result<()> {
        for sample in samples {
            if sample.app_id.trim().is_empty() {
                return Err(Error::Validation(
                    "cannot append a sample without an app_id".to_string(),
                ));
            }
        }
        if samples.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Storage(format!("cannot open {}: {}", self.path.display(), e)))?;

        let mut buf = String::new();
        for sample in samples {
            let line = serde_json::to_string(sample)
                .map_err(|e| Error::Storage(format!("cannot encode sample: {}", e)))?;
            buf.push_str(&line);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", self.path.display(), e)))?;

        self.samples.extend_from_slice(samples);
        Ok(())
    }

    /// All samples for one app with `timestamp >= since`, ascending. Unknown
    /// apps yield an empty vec, not an error.
    pub fn read_window(&self, app_id: &str, since: DateTime<Utc>) -> Vec<Sample> {
        let mut window: Vec<Sample> = self
            .samples
            .iter()
            .filter(|s| s.app_id == app_id && s.timestamp >= since)
            .cloned()
            .collect();
        // Stable, so duplicate timestamps keep insertion order.
        window.sort_by_key(|s| s.timestamp);
        window
    }

    /// Drops every sample strictly older than the cutoff and rewrites the
    /// backing file if anything was dropped. Idempotent: a second call with
    /// the same cutoff and no intervening append is a no-op.
    pub fn trim(&mut self, older_than: DateTime<Utc>) -> Result<usize> {
        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp >= older_than);
        let removed = before - self.samples.len();

        if removed > 0 {
            self.rewrite()?;
            log::debug!("trimmed {} samples older than {}", removed, older_than);
        }
        Ok(removed)
    }

    fn rewrite(&self) -> Result<()> {
        let header = serde_json::to_string(&SchemaHeader::current())
            .map_err(|e| Error::Storage(format!("cannot encode schema header: {}", e)))?;
        let mut buf = String::new();
        buf.push_str(&header);
        buf.push('\n');
        for sample in &self.samples {
            let line = serde_json::to_string(sample)
                .map_err(|e| Error::Storage(format!("cannot encode sample: {}", e)))?;
            buf.push_str(&line);
            buf.push('\n');
        }
        fs::write(&self.path, buf)
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", self.path.display(), e)))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

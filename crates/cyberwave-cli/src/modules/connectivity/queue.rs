use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::warn;

use cyberwave_core::{Error, PendingRecord};

use crate::modules::system::write_atomic;

/// Append-only JSON-lines queue of records awaiting upload.
pub(crate) struct PendingQueue {
    path: PathBuf,
}

impl PendingQueue {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one record. A record is one line, written with a single
    /// syscall, so concurrent CLI invocations interleave whole lines.
    pub(crate) fn enqueue(&self, record: &PendingRecord) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(Error::storage)?;
        }
        let mut line = serde_json::to_string(record).map_err(Error::storage)?;
        line.push('\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::storage)?;
        file.write_all(line.as_bytes()).map_err(Error::storage)?;
        Ok(())
    }

    /// Read every queued record. Lines that fail to parse are dropped with a
    /// warning rather than wedging the queue forever.
    pub(crate) fn load(&self) -> Result<Vec<PendingRecord>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::storage(err)),
        };
        let mut records = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PendingRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(error = %err, "dropping unparseable pending record"),
            }
        }
        Ok(records)
    }

    pub(crate) fn len(&self) -> usize {
        self.load().map(|records| records.len()).unwrap_or(0)
    }

    /// Take every queued record, leaving the file empty via atomic replace.
    pub(crate) fn drain(&self) -> Result<Vec<PendingRecord>, Error> {
        let records = self.load()?;
        if !records.is_empty() {
            write_atomic(&self.path, "").map_err(Error::storage)?;
        }
        Ok(records)
    }
}

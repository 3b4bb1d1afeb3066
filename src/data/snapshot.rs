use crate::config::{DF, PERSISTENCE};
use crate::domain::{Candle, PairId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode snapshot {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("failed to encode snapshot {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("snapshot version mismatch: file v{found} vs required v{required}")]
    VersionMismatch { found: f64, required: f64 },
    #[error("snapshot belongs to {found}, expected {expected}")]
    PairMismatch { found: PairId, expected: PairId },
}

/// Binary snapshot wrapper with metadata
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct SnapshotFile {
    pub version: f64,
    pub saved_at_ms: i64,
    pub pair: PairId,
    pub start_date: NaiveDate,
    pub candles: Vec<Candle>,
}

impl SnapshotFile {
    pub fn new(pair: PairId, start_date: NaiveDate, candles: Vec<Candle>) -> Self {
        Self {
            version: PERSISTENCE.snapshot.version,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
            pair,
            start_date,
            candles,
        }
    }

    /// Reads and validates a snapshot for `expected` pair.
    pub fn read_from_path(path: &Path, expected: &PairId) -> Result<Self, SnapshotError> {
        let start_time = std::time::Instant::now();
        let file = File::open(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let snapshot: SnapshotFile =
            bincode::deserialize_from(reader).map_err(|source| SnapshotError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        if snapshot.version != PERSISTENCE.snapshot.version {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                required: PERSISTENCE.snapshot.version,
            });
        }
        if &snapshot.pair != expected {
            return Err(SnapshotError::PairMismatch {
                found: snapshot.pair,
                expected: expected.clone(),
            });
        }

        if DF.log_snapshot_io {
            log::info!(
                "📂 Snapshot loaded: {} candles from {:?} in {:.2}s",
                snapshot.candles.len(),
                path,
                start_time.elapsed().as_secs_f64()
            );
        }
        Ok(snapshot)
    }

    /// Writes to `<path>.partial` then renames over `path`, so a crash mid-write
    /// leaves the previous snapshot intact.
    pub fn write_to_path(&self, path: &Path) -> Result<(), SnapshotError> {
        let start_time = std::time::Instant::now();
        let partial = path.with_extension(PERSISTENCE.snapshot.partial_extension);

        let file = create_file_with_parents(&partial).map_err(io_error(&partial))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).map_err(|source| SnapshotError::Encode {
            path: partial.clone(),
            source,
        })?;
        writer.flush().map_err(io_error(&partial))?;
        drop(writer);

        fs::rename(&partial, path).map_err(io_error(path))?;

        if DF.log_snapshot_io {
            let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            log::info!(
                "💾 Snapshot written: {:?} ({} candles, {:.1} KB in {:.2}s)",
                path,
                self.candles.len(),
                file_size as f64 / 1024.0,
                start_time.elapsed().as_secs_f64()
            );
        }
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + use<> {
    let path = path.to_path_buf();
    move |source| SnapshotError::Io { path, source }
}

// Helper function to create a new file and any missing parent directories.
fn create_file_with_parents(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    File::create(path)
}

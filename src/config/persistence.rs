//! File persistence and serialization configuration
use crate::domain::PairId;

/// Configuration for candle snapshot persistence
pub struct SnapshotPersistenceConfig {
    /// Default directory for per-pair snapshot files
    pub directory: &'static str,
    /// Current version of the snapshot serialization format
    pub version: f64,
    /// Extension of a half-written snapshot before it is renamed into place
    pub partial_extension: &'static str,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub snapshot: SnapshotPersistenceConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    snapshot: SnapshotPersistenceConfig {
        directory: "candle_data",
        version: 1.0,
        partial_extension: "partial",
    },
};

/// Generate pair-specific snapshot filename.
/// Example: "0xabc…_0xbb4c…_v1.bin"
pub fn snapshot_filename(pair: &PairId) -> String {
    format!(
        "{}_{}_v{}.bin",
        pair.token_address(),
        pair.quote_address(),
        PERSISTENCE.snapshot.version
    )
}

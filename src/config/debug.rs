//! Debugging feature flags.

pub struct LogFlags {
    /// Log every day the fetcher visits (skipped and fetched), not just checkpoints.
    pub log_fetch_days: bool,

    /// Log snapshot reads/writes with file sizes and timings.
    pub log_snapshot_io: bool,

    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,
}

pub const DF: LogFlags = LogFlags {
    log_fetch_days: false,
    log_snapshot_io: true,
    log_performance: false,
};

mod bitquery;
mod fetcher;
mod provider;
mod snapshot;
mod store;

pub use {
    bitquery::BitqueryProvider,
    fetcher::{FetchReport, IncrementalFetcher},
    provider::{MarketDataSource, SourceError},
    snapshot::SnapshotError,
    store::CandleStore,
};

mod crossover_table;
mod ema_table;
mod series;
mod timeseries;

pub use {
    crossover_table::{CrossoverColumn, CrossoverKey, CrossoverSummary, CrossoverTable},
    ema_table::EmaTable,
    series::{PriceField, SeriesName},
    timeseries::TimeIndex,
};

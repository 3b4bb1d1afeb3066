mod perf;
pub mod time_utils;
mod vec_utils;

pub use time_utils::{
    TimeUtils, day_of, day_start_ms, days_inclusive, epoch_ms_to_utc, format_duration,
    minutes_between, previous_day, today_utc,
};

pub(crate) use vec_utils::{index_range_by_key, position_by_key};

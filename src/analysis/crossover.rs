use itertools::Itertools;

use crate::models::{CrossoverColumn, CrossoverKey, SeriesName};
use crate::utils::minutes_between;

/// `mask[t]` is true when `a` moved from strictly below `b` at t-1 to >= `b` at t.
/// Equality at t-1 is not "below". Row 0 is always false.
pub fn crossed_above(a: &[f64], b: &[f64]) -> Vec<bool> {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len().min(b.len());
    let mut mask = vec![false; n];
    for t in 1..n {
        mask[t] = a[t - 1] < b[t - 1] && a[t] >= b[t];
    }
    mask
}

/// Minutes since the latest upward crossing of `a` over `b` at or before each row.
///
/// Returns `None` when the pair never crosses. Rows before the first
/// crossing are `None` inside the column.
pub fn minutes_since_crossover(timestamps: &[i64], a: &[f64], b: &[f64]) -> Option<Vec<Option<f64>>> {
    crossover_column(timestamps, a, b).map(|col| col.minutes_since)
}

/// Full crossover column plus the last crossing instant and the current relationship.
pub fn crossover_column(timestamps: &[i64], a: &[f64], b: &[f64]) -> Option<CrossoverColumn> {
    let mask = crossed_above(a, b);
    if !mask.iter().any(|&hit| hit) {
        return None;
    }

    let mut last_event: Option<i64> = None;
    let minutes_since = timestamps
        .iter()
        .zip(&mask)
        .map(|(&ts, &hit)| {
            if hit {
                last_event = Some(ts);
            }
            last_event.map(|event| minutes_between(event, ts))
        })
        .collect();

    let currently_above = match (a.last(), b.last()) {
        (Some(x), Some(y)) => x >= y,
        _ => false,
    };
    Some(CrossoverColumn {
        minutes_since,
        last_crossed_ms: last_event?,
        currently_above,
    })
}

/// Every ordered pair of distinct series, minus raw-vs-raw (fudge_high/fudge_low both ways).
pub fn candidate_pairs(series: &[SeriesName]) -> Vec<CrossoverKey> {
    series
        .iter()
        .copied()
        .unique()
        .permutations(2)
        .filter(|p| !(p[0].is_raw() && p[1].is_raw()))
        .map(|p| CrossoverKey::new(p[0], p[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceField;
    use crate::utils::TimeUtils;

    fn minute_ts(n: usize) -> Vec<i64> {
        (0..n as i64).map(|i| i * TimeUtils::MS_IN_MIN).collect()
    }

    #[test]
    fn documented_example() {
        let a = [1.0, 5.0, 2.0, 6.0];
        let b = [3.0; 4];
        assert_eq!(crossed_above(&a, &b), vec![false, true, false, true]);

        let col = minutes_since_crossover(&minute_ts(4), &a, &b).unwrap();
        assert_eq!(col, vec![None, Some(0.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn never_crossing_is_omitted() {
        let a = [5.0, 6.0, 7.0];
        let b = [1.0, 2.0, 3.0];
        assert!(minutes_since_crossover(&minute_ts(3), &a, &b).is_none());
        assert!(crossover_column(&minute_ts(3), &a, &b).is_none());
    }

    #[test]
    fn equality_at_prior_step_is_not_below() {
        // a touches b at t=1 and rises at t=2: no crossing.
        let a = [3.0, 3.0, 4.0];
        let b = [3.0, 3.0, 3.0];
        assert_eq!(crossed_above(&a, &b), vec![false; 3]);

        // Reaching equality from below counts.
        let a = [2.0, 3.0];
        let b = [3.0, 3.0];
        assert_eq!(crossed_above(&a, &b), vec![false, true]);
    }

    #[test]
    fn value_grows_with_gaps_in_time() {
        let ts = [0, TimeUtils::MS_IN_MIN, 5 * TimeUtils::MS_IN_MIN, 65 * TimeUtils::MS_IN_MIN];
        let a = [1.0, 4.0, 4.0, 4.0];
        let b = [3.0; 4];
        let col = crossover_column(&ts, &a, &b).unwrap();
        assert_eq!(col.minutes_since, vec![None, Some(0.0), Some(4.0), Some(64.0)]);
        assert_eq!(col.last_crossed_ms, TimeUtils::MS_IN_MIN);
        assert!(col.currently_above);
    }

    #[test]
    fn last_crossing_keeps_exact_timestamp() {
        // Irregular, sub-minute spacing: the instant must not be rebuilt from minutes.
        let ts = [1_000, 38_777, 100_003, 161_111];
        let a = [1.0, 4.0, 1.0, 5.0];
        let b = [3.0; 4];
        let col = crossover_column(&ts, &a, &b).unwrap();
        assert_eq!(col.last_crossed_ms, 161_111);
        assert_eq!(col.minutes_since[2], Some(minutes_between(38_777, 100_003)));
    }

    #[test]
    fn current_relationship_can_be_below() {
        let a = [1.0, 5.0, 1.0];
        let b = [3.0; 3];
        let col = crossover_column(&minute_ts(3), &a, &b).unwrap();
        assert_eq!(col.minutes_since, vec![None, Some(0.0), Some(1.0)]);
        assert!(!col.currently_above);
    }

    #[test]
    fn candidate_pairs_exclude_raw_vs_raw() {
        let series = [
            SeriesName::FUDGE_HIGH,
            SeriesName::FUDGE_LOW,
            SeriesName::ema(PriceField::High, 10),
            SeriesName::ema(PriceField::Low, 10),
        ];
        let pairs = candidate_pairs(&series);
        // 4·3 ordered pairs minus the two raw-vs-raw ones.
        assert_eq!(pairs.len(), 10);
        assert!(!pairs.contains(&CrossoverKey::new(SeriesName::FUDGE_HIGH, SeriesName::FUDGE_LOW)));
        assert!(!pairs.contains(&CrossoverKey::new(SeriesName::FUDGE_LOW, SeriesName::FUDGE_HIGH)));
        assert!(pairs.contains(&CrossoverKey::new(
            SeriesName::FUDGE_HIGH,
            SeriesName::ema(PriceField::High, 10)
        )));
        assert!(pairs.iter().all(|k| k.rising != k.reference));
    }
}

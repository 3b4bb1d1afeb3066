/// Exponential moving average, pandas `ewm(span, adjust=False)` convention.
///
/// bar 0  → value = x[0]
/// bar 1+ → value = prev + α·(x − prev), α = 2/(span+1)
///
/// NaN inputs propagate forward like any other IEEE arithmetic.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Feed one observation and return the updated average.
    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => prev + self.alpha * (x - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Full EMA column over `values`, same length as the input.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Ema::new(span);
    values.iter().map(|&x| ema.update(x)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_is_its_own_average() {
        for span in [1, 10, 20, 60, 120] {
            assert_eq!(ema_series(&[42.5], span), vec![42.5]);
        }
    }

    #[test]
    fn matches_pandas_adjust_false() {
        // pd.Series([10,11,12,13]).ewm(span=3, adjust=False).mean()
        let out = ema_series(&[10.0, 11.0, 12.0, 13.0], 3);
        let expected = [10.0, 10.5, 11.25, 12.125];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn empty_input() {
        assert!(ema_series(&[], 10).is_empty());
        assert_eq!(Ema::new(10).value(), None);
    }

    #[test]
    fn nan_propagates() {
        let out = ema_series(&[1.0, f64::NAN, 3.0], 2);
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }

    #[test]
    fn constant_series_stays_flat() {
        let out = ema_series(&[7.0; 50], 20);
        assert!(out.iter().all(|v| (*v - 7.0).abs() < 1e-12));
    }
}

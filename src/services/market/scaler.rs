/// Min-max scaler fitted on a single window of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// `None` for an empty or non-finite input.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { min, max })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.range() <= f64::EPSILON * self.max.abs().max(1.0)
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.min) / self.range()
        }
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform(*v)).collect()
    }

    /// A constant window has no scale to recover, so every output maps back
    /// to the constant.
    pub fn inverse(&self, scaled: f64) -> f64 {
        if self.is_degenerate() {
            self.min
        } else {
            scaled * self.range() + self.min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_unit_interval() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 15.0]).unwrap();
        assert_eq!(scaler.transform_all(&[10.0, 20.0, 15.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(scaler.inverse(0.25), 12.5);
        // Extrapolates outside the fitted range.
        assert_eq!(scaler.inverse(1.5), 25.0);
    }

    #[test]
    fn test_constant_window() {
        let scaler = MinMaxScaler::fit(&[100.0; 60]).unwrap();
        assert!(scaler.is_degenerate());
        assert_eq!(scaler.transform(100.0), 0.0);
        assert_eq!(scaler.inverse(0.73), 100.0);
    }

    #[test]
    fn test_rejects_unusable_input() {
        assert!(MinMaxScaler::fit(&[]).is_none());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_none());
    }
}

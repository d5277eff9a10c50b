//! Trailing-window technical indicators
//!
//! Both indicators return one value per input close. The first `period - 1`
//! entries have no full window behind them and are reported as `0.0`.

/// Simple moving average over a trailing window.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![0.0; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// Relative Strength Index from the mean gain and mean loss of the trailing
/// `period` price changes. The first close has no predecessor and counts as
/// an unchanged day.
///
/// A window with losses but no gains gives 0, gains but no losses gives 100,
/// and a window with neither is undefined and reported as 0.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![0.0; n];
    if period == 0 || n < period {
        return result;
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let mut gain_sum: f64 = gains[..period].iter().sum();
    let mut loss_sum: f64 = losses[..period].iter().sum();
    for i in (period - 1)..n {
        if i >= period {
            gain_sum += gains[i] - gains[i - period];
            loss_sum += losses[i] - losses[i - period];
        }
        result[i] = rsi_value(gain_sum / period as f64, loss_sum / period as f64);
    }
    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    // Rolling sums drift slightly below zero after long flat stretches.
    let avg_gain = avg_gain.max(0.0);
    let avg_loss = avg_loss.max(0.0);
    if avg_loss <= f64::EPSILON {
        if avg_gain <= f64::EPSILON {
            0.0
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_zero_fills_warmup() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 3), vec![0.0, 0.0, 2.0, 3.0]);
        assert_eq!(sma(&[1.0, 2.0], 3), vec![0.0, 0.0]);
        assert_eq!(sma(&[5.0, 5.0], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_sma_flat_series() {
        let values = vec![100.0; 60];
        let ma = sma(&values, 50);
        assert_eq!(ma.len(), 60);
        assert!(ma[..49].iter().all(|v| *v == 0.0));
        assert!(ma[49..].iter().all(|v| (*v - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_rsi_small_window() {
        let values = rsi(&[1.0, 2.0, 1.0], 2);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 100.0);
        assert!((values[2] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_trends() {
        let rising: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let up = rsi(&rising, 14);
        assert!(up[..13].iter().all(|v| *v == 0.0));
        assert!(up[13..].iter().all(|v| (*v - 100.0).abs() < 1e-9));

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let down = rsi(&falling, 14);
        assert!(down[13..].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_rsi_bounded_on_mixed_series() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.01)
            .collect();
        for value in rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_flat_series_is_undefined() {
        assert!(rsi(&[100.0; 30], 14).iter().all(|v| *v == 0.0));
    }
}

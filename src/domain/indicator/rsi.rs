//! RSI (Relative Strength Index) over a rolling simple mean.
//!
//! For each position i >= period, gains and losses are the positive and
//! negative close-to-close changes of the last `period` bars:
//!
//! RSI = 100 - 100 / (1 + mean_gain / mean_loss)
//!
//! mean_loss == 0 gives 100 when there were gains; a window with no movement
//! at all is undefined. Positions before `period` are undefined.

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return values;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..closes.len() {
        // changes[j] is the move into bar j + 1
        let window = &changes[i - period..i];
        if window.iter().any(|c| !c.is_finite()) {
            continue;
        }

        let gain: f64 = window.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
        let loss: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum::<f64>() / period as f64;

        values[i] = if loss == 0.0 {
            if gain > 0.0 { Some(100.0) } else { None }
        } else {
            Some(100.0 - 100.0 / (1.0 + gain / loss))
        };
    }

    values
}

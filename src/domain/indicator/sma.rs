//! Simple moving average of closes.
//!
//! Sliding-window sum; the first `period - 1` positions are undefined, as is
//! every window holding a non-finite close.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut window_sum = 0.0;
    let mut masked = 0usize;

    for (i, &close) in closes.iter().enumerate() {
        if close.is_finite() {
            window_sum += close;
        } else {
            masked += 1;
        }
        if i >= period {
            let leaving = closes[i - period];
            if leaving.is_finite() {
                window_sum -= leaving;
            } else {
                masked -= 1;
            }
        }

        if i + 1 >= period && masked == 0 {
            values.push(Some(window_sum / period as f64));
        } else {
            values.push(None);
        }
    }

    values
}

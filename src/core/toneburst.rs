use crate::utils::error::{Result, SimError};
use std::f64::consts::PI;

/// Symmetric Hann window of `size` points (ends at zero).
pub fn hann_window(index: usize, size: usize) -> f64 {
    if size <= 1 {
        return 1.0;
    }
    0.5 - 0.5 * ((2.0 * PI * index as f64) / (size as f64 - 1.0)).cos()
}

/// Hann-windowed sine burst of `num_cycles` periods at `centre_freq`, sampled
/// every `dt`, with a peak magnitude of 1.
///
/// The burst spans `ceil(num_cycles / (centre_freq * dt))` samples. With
/// `num_samples` the output is zero-padded to that length. With `wrap` the
/// output is rotated so the middle of the burst lands on sample 0 and its
/// first half wraps around to the end.
pub fn make_toneburst(
    num_cycles: u32,
    centre_freq: f64,
    dt: f64,
    num_samples: Option<usize>,
    wrap: bool,
) -> Result<Vec<f64>> {
    if num_cycles == 0 {
        return Err(SimError::invalid_value("toneburst.num_cycles", num_cycles, "must be at least 1"));
    }
    if !(centre_freq > 0.0 && centre_freq.is_finite()) {
        return Err(SimError::invalid_value("toneburst.centre_freq", centre_freq, "must be positive"));
    }
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimError::invalid_value("toneburst.dt", dt, "must be positive"));
    }

    // shave off rounding noise so 5 cycles at exactly 20 samples/cycle stay 100 samples
    let exact_len = num_cycles as f64 / (centre_freq * dt);
    let burst_len = ((exact_len * (1.0 - 1e-12)).ceil() as usize).max(1);
    let total_len = match num_samples {
        Some(n) if n < burst_len => {
            return Err(SimError::invalid_value(
                "toneburst.num_samples",
                n,
                format!("shorter than the burst ({} samples)", burst_len),
            ))
        }
        Some(n) => n,
        None => burst_len,
    };

    let mut signal = vec![0.0; total_len];
    for (i, value) in signal.iter_mut().take(burst_len).enumerate() {
        let t = i as f64 * dt;
        *value = hann_window(i, burst_len) * (2.0 * PI * centre_freq * t).sin();
    }

    let peak = signal.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if peak > 0.0 {
        signal.iter_mut().for_each(|v| *v /= peak);
    }

    if wrap {
        signal.rotate_left(burst_len / 2);
    }
    Ok(signal)
}

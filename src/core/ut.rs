//! Signal toolbox for ultrasonic testing: acquisition schemes, scanline
//! weights, decibel scaling, phase helpers and time vectors.
//!
//! Nothing in here knows about scenarios or probes; the functions work on
//! plain element indices and sample buffers.

use crate::domain::model::CaptureMethod;
use crate::utils::error::{Result, SimError};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

/// All transmitter/receiver pairs of a full matrix capture.
///
/// `tx` is `0, 0, .., 1, 1, ..` and `rx` is `0, 1, .., 0, 1, ..`.
pub fn fmc(numelements: usize) -> (Vec<usize>, Vec<usize>) {
    let mut tx = Vec::with_capacity(numelements * numelements);
    let mut rx = Vec::with_capacity(numelements * numelements);
    for t in 0..numelements {
        for r in 0..numelements {
            tx.push(t);
            rx.push(r);
        }
    }
    (tx, rx)
}

/// Half matrix capture: every pair with `rx >= tx`, sorted by `tx` then `rx`.
pub fn hmc(numelements: usize) -> (Vec<usize>, Vec<usize>) {
    let numscanlines = numelements * (numelements + 1) / 2;
    let mut tx = Vec::with_capacity(numscanlines);
    let mut rx = Vec::with_capacity(numscanlines);
    for t in 0..numelements {
        for r in t..numelements {
            tx.push(t);
            rx.push(r);
        }
    }
    (tx, rx)
}

pub fn capture_pairs(method: CaptureMethod, numelements: usize) -> Result<(Vec<usize>, Vec<usize>)> {
    match method {
        CaptureMethod::Fmc => Ok(fmc(numelements)),
        CaptureMethod::Hmc => Ok(hmc(numelements)),
        CaptureMethod::Unsupported => Err(SimError::processing(
            "cannot generate scanlines for an unsupported capture method",
        )),
    }
}

fn check_same_len(tx: &[usize], rx: &[usize]) -> Result<()> {
    if tx.len() != rx.len() {
        return Err(SimError::processing(format!(
            "tx and rx must have the same lengths (got {} and {})",
            tx.len(),
            rx.len()
        )));
    }
    Ok(())
}

/// Recognise the acquisition scheme from the scanline indices, ignoring
/// their order. An HMC may be stored with `rx >= tx` or `rx <= tx`.
pub fn infer_capture_method(tx: &[usize], rx: &[usize]) -> Result<CaptureMethod> {
    check_same_len(tx, rx)?;
    let numelements = match tx.iter().chain(rx).max() {
        Some(max) => max + 1,
        None => return Ok(CaptureMethod::Unsupported),
    };

    let combinations: HashSet<(usize, usize)> = tx.iter().copied().zip(rx.iter().copied()).collect();

    let (tx_hmc, rx_hmc) = hmc(numelements);
    if tx_hmc.len() == tx.len() {
        let upper: HashSet<_> = tx_hmc.iter().copied().zip(rx_hmc.iter().copied()).collect();
        let lower: HashSet<_> = rx_hmc.iter().copied().zip(tx_hmc.iter().copied()).collect();
        if combinations == upper || combinations == lower {
            return Ok(CaptureMethod::Hmc);
        }
    }

    let (tx_fmc, rx_fmc) = fmc(numelements);
    if tx_fmc.len() == tx.len() {
        let full: HashSet<_> = tx_fmc.into_iter().zip(rx_fmc).collect();
        if combinations == full {
            return Ok(CaptureMethod::Fmc);
        }
    }

    Ok(CaptureMethod::Unsupported)
}

/// TFM weight of each scanline: 1 when the reciprocal scanline `(rx, tx)`
/// was also acquired, 2 otherwise.
///
/// FMC gives all ones; HMC gives 1 for pulse-echo and 2 elsewhere.
/// Duplicated scanlines are not detected.
pub fn default_scanline_weights(tx: &[usize], rx: &[usize]) -> Result<Vec<f64>> {
    check_same_len(tx, rx)?;
    let pairs: HashSet<(usize, usize)> = tx.iter().copied().zip(rx.iter().copied()).collect();
    Ok(tx
        .iter()
        .zip(rx)
        .map(|(&t, &r)| if pairs.contains(&(r, t)) { 1.0 } else { 2.0 })
        .collect())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecibelOptions {
    /// 0 dB level. `None` uses the largest magnitude, NaN ignored.
    pub reference: Option<f64>,
    /// Replacement for -inf dB (zero magnitude). `None` keeps -inf.
    pub neginf_value: Option<f64>,
}

impl Default for DecibelOptions {
    fn default() -> Self {
        Self {
            reference: None,
            neginf_value: Some(-1000.0),
        }
    }
}

/// `20 log10(|v| / reference)`. Returns the values and the reference used.
pub fn decibel(values: &[f64], options: &DecibelOptions) -> Result<(Vec<f64>, f64)> {
    let reference = match options.reference {
        Some(reference) if reference > 0.0 => reference,
        Some(reference) => {
            return Err(SimError::invalid_value(
                "decibel.reference",
                reference,
                "reference must be strictly positive",
            ))
        }
        None => values
            .iter()
            .map(|v| v.abs())
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, f64::max),
    };

    let db = values
        .iter()
        .map(|v| {
            let db = 20.0 * (v.abs() / reference).log10();
            match options.neginf_value {
                Some(replacement) if db == f64::NEG_INFINITY => replacement,
                _ => db,
            }
        })
        .collect();
    Ok((db, reference))
}

/// Phase wrapped into `[-pi, pi)`.
pub fn wrap_phase(phase: f64) -> f64 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}

/// For `x(t) = A exp(i (2 pi f0 t + phi(t)))`, returns `phi(t)` wrapped into
/// `[-pi, pi)`. The input must be the analytic signal, see [`analytic_signal`].
pub fn instantaneous_phase_shift(
    analytic_sig: &[Complex<f64>],
    time_vect: &[f64],
    carrier_frequency: f64,
) -> Result<Vec<f64>> {
    if analytic_sig.len() != time_vect.len() {
        return Err(SimError::processing(format!(
            "signal has {} samples but time vector has {}",
            analytic_sig.len(),
            time_vect.len()
        )));
    }
    Ok(analytic_sig
        .iter()
        .zip(time_vect)
        .map(|(x, t)| wrap_phase(x.arg() - 2.0 * PI * carrier_frequency * t))
        .collect())
}

/// `num` samples `start, start + step, ..`.
///
/// Computed as `start + i * step` so the sample count is exact, unlike
/// accumulating `step` until a stop value is reached.
pub fn make_timevect(num: usize, step: f64, start: f64) -> Vec<f64> {
    (0..num).map(|i| start + i as f64 * step).collect()
}

/// Analytic signal of a real buffer (FFT-based Hilbert transform).
/// The real part reproduces the input.
pub fn analytic_signal(signal: &[f64]) -> Vec<Complex<f64>> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut buffer);

    // Keep DC (and Nyquist for even n), double positive frequencies, drop negative ones.
    let positive_end = if n % 2 == 0 { n / 2 } else { (n + 1) / 2 };
    for (k, value) in buffer.iter_mut().enumerate() {
        let h = if k == 0 || (n % 2 == 0 && k == n / 2) {
            1.0
        } else if k < positive_end {
            2.0
        } else {
            0.0
        };
        *value *= h;
    }

    inverse.process(&mut buffer);
    let scale = 1.0 / n as f64;
    buffer.into_iter().map(|c| c * scale).collect()
}

/// Regularly sampled time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Time {
    pub start: f64,
    pub step: f64,
    pub num: usize,
}

impl Time {
    pub fn new(start: f64, step: f64, num: usize) -> Result<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(SimError::invalid_value("time.step", step, "step must be positive"));
        }
        if !start.is_finite() {
            return Err(SimError::invalid_value("time.start", start, "start must be finite"));
        }
        Ok(Self { start, step, num })
    }

    pub fn len(&self) -> usize {
        self.num
    }

    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    pub fn samples(&self) -> Vec<f64> {
        make_timevect(self.num, self.step, self.start)
    }

    pub fn end(&self) -> f64 {
        self.start + self.num.saturating_sub(1) as f64 * self.step
    }

    /// Index of the sample nearest to `t`, clamped to the axis.
    pub fn closest_index(&self, t: f64) -> usize {
        if self.num == 0 {
            return 0;
        }
        let idx = ((t - self.start) / self.step).round();
        if idx <= 0.0 || idx.is_nan() {
            0
        } else {
            (idx as usize).min(self.num - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_fmc() {
        let (tx, rx) = fmc(3);
        assert_eq!(tx, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(rx, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_hmc() {
        let (tx, rx) = hmc(3);
        assert_eq!(tx, vec![0, 0, 0, 1, 1, 2]);
        assert_eq!(rx, vec![0, 1, 2, 1, 2, 2]);

        let (tx, rx) = hmc(64);
        assert_eq!(tx.len(), 64 * 65 / 2);
        assert!(tx.iter().zip(&rx).all(|(t, r)| r >= t));
    }

    #[test]
    fn test_infer_capture_method() {
        let (tx, rx) = fmc(4);
        assert_eq!(infer_capture_method(&tx, &rx).unwrap(), CaptureMethod::Fmc);

        let (tx, rx) = hmc(4);
        assert_eq!(infer_capture_method(&tx, &rx).unwrap(), CaptureMethod::Hmc);
        // lower triangle, shuffled
        let mut pairs: Vec<_> = rx.iter().copied().zip(tx.iter().copied()).collect();
        pairs.reverse();
        let (tx2, rx2): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        assert_eq!(infer_capture_method(&tx2, &rx2).unwrap(), CaptureMethod::Hmc);

        let tx = vec![0, 1, 2];
        let rx = vec![0, 1, 1];
        assert_eq!(infer_capture_method(&tx, &rx).unwrap(), CaptureMethod::Unsupported);

        assert_eq!(infer_capture_method(&[], &[]).unwrap(), CaptureMethod::Unsupported);
        assert!(infer_capture_method(&[0, 1], &[0]).is_err());
    }

    #[test]
    fn test_single_element_is_hmc() {
        let (tx, rx) = fmc(1);
        assert_eq!(infer_capture_method(&tx, &rx).unwrap(), CaptureMethod::Hmc);
    }

    #[test]
    fn test_default_scanline_weights() {
        let (tx, rx) = fmc(3);
        assert!(default_scanline_weights(&tx, &rx).unwrap().iter().all(|&w| w == 1.0));

        let (tx, rx) = hmc(3);
        assert_eq!(
            default_scanline_weights(&tx, &rx).unwrap(),
            vec![1.0, 2.0, 2.0, 1.0, 2.0, 1.0]
        );

        assert!(default_scanline_weights(&[0, 1], &[1]).is_err());
    }

    #[test]
    fn test_decibel_default_reference() {
        let (db, reference) = decibel(&[1.0, -10.0, 0.0, 0.1], &DecibelOptions::default()).unwrap();
        assert_close(reference, 10.0);
        assert_close(db[0], -20.0);
        assert_close(db[1], 0.0);
        assert_eq!(db[2], -1000.0);
        assert_close(db[3], -40.0);
    }

    #[test]
    fn test_decibel_explicit_reference_and_neginf() {
        let options = DecibelOptions {
            reference: Some(2.0),
            neginf_value: None,
        };
        let (db, reference) = decibel(&[2.0, 0.0, f64::NAN], &options).unwrap();
        assert_eq!(reference, 2.0);
        assert_close(db[0], 0.0);
        assert_eq!(db[1], f64::NEG_INFINITY);
        assert!(db[2].is_nan());

        let bad = DecibelOptions {
            reference: Some(0.0),
            neginf_value: None,
        };
        assert!(decibel(&[1.0], &bad).is_err());
    }

    #[test]
    fn test_decibel_ignores_nan_for_reference() {
        let (_, reference) = decibel(&[f64::NAN, 3.0, -4.0], &DecibelOptions::default()).unwrap();
        assert_eq!(reference, 4.0);
    }

    #[test]
    fn test_wrap_phase() {
        assert_close(wrap_phase(0.0), 0.0);
        assert_close(wrap_phase(PI), -PI);
        assert_close(wrap_phase(-PI), -PI);
        assert_close(wrap_phase(3.0 * PI / 2.0), -PI / 2.0);
        assert_close(wrap_phase(-3.0 * PI / 2.0), PI / 2.0);
        assert_close(wrap_phase(10.0 * PI + 0.5), 0.5);
    }

    #[test]
    fn test_instantaneous_phase_shift() {
        let f0 = 1e6;
        let phi = 0.3;
        let time = make_timevect(50, 1e-8, 0.0);
        let sig: Vec<_> = time
            .iter()
            .map(|t| Complex::from_polar(2.0, 2.0 * PI * f0 * t + phi))
            .collect();
        let phase = instantaneous_phase_shift(&sig, &time, f0).unwrap();
        for p in phase {
            assert!((p - phi).abs() < 1e-9);
        }
        assert!(instantaneous_phase_shift(&sig, &time[1..], f0).is_err());
    }

    #[test]
    fn test_make_timevect() {
        let t = make_timevect(10, 0.1, 0.0);
        assert_eq!(t.len(), 10);
        assert_close(t[9], 0.9);

        let t = make_timevect(10, 0.1, 1.0);
        assert_close(t[0], 1.0);
        assert_close(t[9], 1.9);

        assert!(make_timevect(0, 0.1, 1.0).is_empty());
        assert_eq!(make_timevect(1, 0.1, 2.0), vec![2.0]);
    }

    #[test]
    fn test_time() {
        let time = Time::new(0.5e-6, 1.0 / 20e6, 100).unwrap();
        assert_eq!(time.len(), 100);
        assert_close(time.end(), 0.5e-6 + 99.0 / 20e6);
        assert_eq!(time.closest_index(0.0), 0);
        assert_eq!(time.closest_index(0.5e-6 + 10.2 / 20e6), 10);
        assert_eq!(time.closest_index(1.0), 99);
        assert!(Time::new(0.0, 0.0, 10).is_err());
    }

    #[test]
    fn test_analytic_signal_of_cosine() {
        let n = 64;
        let cycles = 4.0;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * cycles * i as f64 / n as f64).cos())
            .collect();
        let analytic = analytic_signal(&signal);
        for (i, z) in analytic.iter().enumerate() {
            let expected_im = (2.0 * PI * cycles * i as f64 / n as f64).sin();
            assert!((z.re - signal[i]).abs() < 1e-9);
            assert!((z.im - expected_im).abs() < 1e-9);
            assert!((z.norm() - 1.0).abs() < 1e-9);
        }
        assert!(analytic_signal(&[]).is_empty());
    }

    #[test]
    fn test_analytic_signal_odd_length_keeps_real_part() {
        let signal = [0.0, 1.0, 0.5, -0.25, 2.0];
        let analytic = analytic_signal(&signal);
        for (z, x) in analytic.iter().zip(signal) {
            assert!((z.re - x).abs() < 1e-9);
        }
    }
}

//! Total focusing method (delay and sum) for contact inspections.
//!
//! A view pairs a transmit leg with a receive leg; a leg is either direct or
//! skips once on a wall, e.g. `LL-T` goes down in L, bounces on the backwall
//! in L and comes back to the probe in T.
//!
//! Lookup times are stored as `(numpoints, numcolumns)` arrays: per element
//! when coming out of [`contact_lookup_times`], per scanline once gathered by
//! [`scanline_lookup_times`].

use crate::config::scenario::{MaterialConfig, Scenario};
use crate::core::geometry::{self, Grid, Point};
use crate::core::probe::Probe;
use crate::core::ut::{self, Time};
use crate::domain::model::Mode;
use crate::utils::error::{Result, SimError};
use ndarray::{Array2, Array3, ArrayView1, Axis};
use rustfft::num_complex::Complex;
use std::sync::Arc;

/// One acquisition: a scanline per (tx, rx) pair, sampled on `time`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub scanlines: Array2<Complex<f64>>,
    pub time: Time,
    pub tx: Vec<usize>,
    pub rx: Vec<usize>,
}

impl Frame {
    pub fn new(
        scanlines: Array2<Complex<f64>>,
        time: Time,
        tx: Vec<usize>,
        rx: Vec<usize>,
    ) -> Result<Self> {
        let (numscanlines, numsamples) = scanlines.dim();
        if tx.len() != numscanlines || rx.len() != numscanlines {
            return Err(SimError::processing(format!(
                "{} scanlines but {} tx and {} rx indices",
                numscanlines,
                tx.len(),
                rx.len()
            )));
        }
        if numsamples != time.len() {
            return Err(SimError::processing(format!(
                "scanlines have {} samples but the time vector has {}",
                numsamples,
                time.len()
            )));
        }
        Ok(Self {
            scanlines,
            time,
            tx,
            rx,
        })
    }

    /// Frame from raw (real) scanlines; each row is replaced by its analytic signal.
    pub fn from_real(scanlines: &Array2<f64>, time: Time, tx: Vec<usize>, rx: Vec<usize>) -> Result<Self> {
        let mut analytic = Array2::zeros(scanlines.dim());
        for (row, mut out) in scanlines.axis_iter(Axis(0)).zip(analytic.axis_iter_mut(Axis(0))) {
            let samples: Vec<f64> = row.iter().copied().collect();
            for (dst, src) in out.iter_mut().zip(ut::analytic_signal(&samples)) {
                *dst = src;
            }
        }
        Self::new(analytic, time, tx, rx)
    }

    pub fn numscanlines(&self) -> usize {
        self.tx.len()
    }
}

/// Direct time of flight from every element to every point at `velocity`.
pub fn contact_lookup_times(elements: &[Point], points: &[Point], velocity: f64) -> Result<Array2<f64>> {
    check_velocity(velocity)?;
    Ok(Array2::from_shape_fn((points.len(), elements.len()), |(p, e)| {
        geometry::distance(&points[p], &elements[e]) / velocity
    }))
}

/// Column `elements_idx[s]` of `per_element` for every scanline `s`.
pub fn scanline_lookup_times(per_element: &Array2<f64>, elements_idx: &[usize]) -> Result<Array2<f64>> {
    let numelements = per_element.ncols();
    if let Some(&bad) = elements_idx.iter().find(|&&e| e >= numelements) {
        return Err(SimError::processing(format!(
            "element index {} out of range ({} elements)",
            bad, numelements
        )));
    }
    Ok(per_element.select(Axis(1), elements_idx))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeExtrema {
    pub tmin: f64,
    pub tmax: f64,
    pub tx_elt_for_tmin: usize,
    pub rx_elt_for_tmin: usize,
    pub tx_elt_for_tmax: usize,
    pub rx_elt_for_tmax: usize,
}

fn check_lookup_shape(name: &str, times: &Array2<f64>, numpoints: usize, numscanlines: usize) -> Result<()> {
    if times.dim() != (numpoints, numscanlines) {
        return Err(SimError::processing(format!(
            "{} has shape {:?}, expected ({}, {})",
            name,
            times.dim(),
            numpoints,
            numscanlines
        )));
    }
    Ok(())
}

/// Shortest and longest total time of flight `tx + rx` over the grid points
/// lying on the grid's bounding box, with the elements of the scanlines that
/// reach them. Used to size the time window of an acquisition.
pub fn extrema_lookup_times_in_rectbox(
    grid: &Grid,
    lookup_times_tx: &Array2<f64>,
    lookup_times_rx: &Array2<f64>,
    tx: &[usize],
    rx: &[usize],
) -> Result<TimeExtrema> {
    if tx.len() != rx.len() {
        return Err(SimError::processing("tx and rx must have the same lengths"));
    }
    check_lookup_shape("lookup_times_tx", lookup_times_tx, grid.numpoints(), tx.len())?;
    check_lookup_shape("lookup_times_rx", lookup_times_rx, grid.numpoints(), tx.len())?;

    let mut min: Option<(f64, usize)> = None;
    let mut max: Option<(f64, usize)> = None;
    for point_idx in (0..grid.numpoints()).filter(|&i| grid.is_on_rectbox(i)) {
        let row_tx = lookup_times_tx.row(point_idx);
        let row_rx = lookup_times_rx.row(point_idx);
        for (scanline, (t_tx, t_rx)) in row_tx.iter().zip(row_rx.iter()).enumerate() {
            let t = t_tx + t_rx;
            if t.is_nan() {
                continue;
            }
            if min.map_or(true, |(m, _)| t < m) {
                min = Some((t, scanline));
            }
            if max.map_or(true, |(m, _)| t > m) {
                max = Some((t, scanline));
            }
        }
    }

    match (min, max) {
        (Some((tmin, smin)), Some((tmax, smax))) => Ok(TimeExtrema {
            tmin,
            tmax,
            tx_elt_for_tmin: tx[smin],
            rx_elt_for_tmin: rx[smin],
            tx_elt_for_tmax: tx[smax],
            rx_elt_for_tmax: rx[smax],
        }),
        _ => Err(SimError::processing("no finite lookup time in the grid box")),
    }
}

/// Linear interpolation of a sampled signal; `None` outside the time axis.
fn interpolate(scanline: ArrayView1<Complex<f64>>, time: &Time, t: f64) -> Option<Complex<f64>> {
    if time.is_empty() {
        return None;
    }
    let pos = (t - time.start) / time.step;
    let last = (time.len() - 1) as f64;
    if pos.is_nan() || pos < 0.0 || pos > last {
        return None;
    }
    let i0 = pos.floor() as usize;
    if i0 + 1 >= time.len() {
        return Some(scanline[i0]);
    }
    let frac = pos - i0 as f64;
    Some(scanline[i0] * (1.0 - frac) + scanline[i0 + 1] * frac)
}

/// `res[p] = sum_s w_s * x_s(t_tx[p, s] + t_rx[p, s]) / numscanlines`.
///
/// Samples whose time falls outside the frame's time axis contribute
/// `fillvalue` instead. Scanlines with a zero weight are skipped.
pub fn delay_and_sum(
    frame: &Frame,
    lookup_times_tx: &Array2<f64>,
    lookup_times_rx: &Array2<f64>,
    scanline_weights: &[f64],
    fillvalue: Complex<f64>,
) -> Result<Vec<Complex<f64>>> {
    let numscanlines = frame.numscanlines();
    if scanline_weights.len() != numscanlines {
        return Err(SimError::processing(format!(
            "{} scanline weights for {} scanlines",
            scanline_weights.len(),
            numscanlines
        )));
    }
    let numpoints = lookup_times_tx.nrows();
    check_lookup_shape("lookup_times_tx", lookup_times_tx, numpoints, numscanlines)?;
    check_lookup_shape("lookup_times_rx", lookup_times_rx, numpoints, numscanlines)?;
    if numscanlines == 0 {
        return Err(SimError::processing("frame has no scanlines"));
    }

    let norm = 1.0 / numscanlines as f64;
    let res = (0..numpoints)
        .map(|p| {
            let mut acc = Complex::new(0.0, 0.0);
            for s in 0..numscanlines {
                if scanline_weights[s] == 0.0 {
                    continue;
                }
                let t = lookup_times_tx[[p, s]] + lookup_times_rx[[p, s]];
                let sample = interpolate(frame.scanlines.row(s), &frame.time, t).unwrap_or(fillvalue);
                acc += sample * scanline_weights[s];
            }
            acc * norm
        })
        .collect();
    Ok(res)
}

/// One leg of a view, from the probe elements to the grid points.
#[derive(Debug, Clone, PartialEq)]
pub enum Leg {
    /// Straight line through the block.
    Direct { mode: Mode, velocity: f64 },
    /// Reflected once on a wall. `modes[0]` travels from the probe to the
    /// wall, `modes[1]` from the wall to the grid.
    Skip {
        modes: [Mode; 2],
        velocities: [f64; 2],
        wall: Arc<[Point]>,
    },
}

fn check_velocity(velocity: f64) -> Result<()> {
    if !(velocity > 0.0 && velocity.is_finite()) {
        return Err(SimError::invalid_value("velocity", velocity, "must be positive"));
    }
    Ok(())
}

impl Leg {
    pub fn direct(mode: Mode, velocity: f64) -> Self {
        Leg::Direct { mode, velocity }
    }

    pub fn skip(modes: [Mode; 2], velocities: [f64; 2], wall: Arc<[Point]>) -> Self {
        Leg::Skip {
            modes,
            velocities,
            wall,
        }
    }

    /// Modes from the probe side, e.g. `LT`.
    pub fn name(&self) -> String {
        match self {
            Leg::Direct { mode, .. } => mode.short_name().to_string(),
            Leg::Skip { modes, .. } => format!("{}{}", modes[0].short_name(), modes[1].short_name()),
        }
    }

    /// Modes from the grid side, e.g. `TL`.
    pub fn reversed_name(&self) -> String {
        self.name().chars().rev().collect()
    }

    /// `(numpoints, numelements)` times of flight along this leg. For a skip
    /// the bounce point is the wall point minimising the total time.
    pub fn lookup_times(&self, elements: &[Point], points: &[Point]) -> Result<Array2<f64>> {
        match self {
            Leg::Direct { velocity, .. } => contact_lookup_times(elements, points, *velocity),
            Leg::Skip {
                velocities, wall, ..
            } => {
                if wall.is_empty() {
                    return Err(SimError::processing("a skip needs at least one wall point"));
                }
                check_velocity(velocities[0])?;
                check_velocity(velocities[1])?;
                let to_wall = contact_lookup_times(wall, elements, velocities[0])?;
                let from_wall = contact_lookup_times(wall, points, velocities[1])?;
                Ok(Array2::from_shape_fn((points.len(), elements.len()), |(p, e)| {
                    to_wall
                        .row(e)
                        .iter()
                        .zip(from_wall.row(p).iter())
                        .map(|(a, b)| a + b)
                        .fold(f64::INFINITY, f64::min)
                }))
            }
        }
    }
}

/// Transmit leg and receive leg of an imaging view, named `tx-rx` with the
/// receive leg read from the grid back to the probe (`LL-T`, `T-LL`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub tx_leg: Leg,
    pub rx_leg: Leg,
}

impl View {
    pub fn new(tx_leg: Leg, rx_leg: Leg) -> Self {
        Self {
            name: format!("{}-{}", tx_leg.name(), rx_leg.reversed_name()),
            tx_leg,
            rx_leg,
        }
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.rx_leg.clone(), self.tx_leg.clone())
    }

    pub fn is_symmetric(&self) -> bool {
        self.tx_leg == self.rx_leg
    }
}

/// Per element lookup times of the transmit and receive legs.
pub fn view_lookup_times(
    view: &View,
    elements: &[Point],
    points: &[Point],
) -> Result<(Array2<f64>, Array2<f64>)> {
    let tx = view.tx_leg.lookup_times(elements, points)?;
    let rx = if view.is_symmetric() {
        tx.clone()
    } else {
        view.rx_leg.lookup_times(elements, points)?
    };
    Ok((tx, rx))
}

/// Views of a contact inspection: direct legs and skips on `backwall` in
/// every mode the block supports, one view per unordered pair of legs.
pub fn contact_views(block: &MaterialConfig, backwall: &[Point]) -> Result<Vec<View>> {
    let modes: Vec<(Mode, f64)> = [Mode::Longitudinal, Mode::Transverse]
        .into_iter()
        .filter_map(|mode| block.velocity(mode).map(|v| (mode, v)))
        .collect();
    for &(_, velocity) in &modes {
        check_velocity(velocity)?;
    }

    let wall: Arc<[Point]> = backwall.into();
    let mut legs: Vec<Leg> = modes.iter().map(|&(mode, v)| Leg::direct(mode, v)).collect();
    for &(m0, v0) in &modes {
        for &(m1, v1) in &modes {
            legs.push(Leg::skip([m0, m1], [v0, v1], wall.clone()));
        }
    }

    let mut views = Vec::with_capacity(legs.len() * (legs.len() + 1) / 2);
    for (i, tx_leg) in legs.iter().enumerate() {
        for rx_leg in &legs[i..] {
            views.push(View::new(tx_leg.clone(), rx_leg.clone()));
        }
    }
    Ok(views)
}

/// Contact views of a scenario, skipping on its backwall.
pub fn scenario_views(scenario: &Scenario) -> Result<Vec<View>> {
    let backwall = geometry::wall_points(&scenario.backwall)?;
    contact_views(&scenario.block_material, &backwall)
}

/// TFM of a frame for one view. The result has the shape of the grid.
///
/// A scanline whose reciprocal was not acquired (HMC) also stands for it: for
/// an asymmetric view it is summed a second time with the legs swapped.
pub fn tfm_for_view(
    frame: &Frame,
    probe: &Probe,
    grid: &Grid,
    view: &View,
    fillvalue: Complex<f64>,
) -> Result<Array3<Complex<f64>>> {
    let (per_element_tx, per_element_rx) = view_lookup_times(view, &probe.locations, &grid.to_points())?;
    let lookup_tx = scanline_lookup_times(&per_element_tx, &frame.tx)?;
    let lookup_rx = scanline_lookup_times(&per_element_rx, &frame.rx)?;
    let weights = ut::default_scanline_weights(&frame.tx, &frame.rx)?;

    tracing::debug!(
        "TFM {} over {} points with {} scanlines",
        view.name,
        grid.numpoints(),
        frame.numscanlines()
    );
    let res = if view.is_symmetric() {
        delay_and_sum(frame, &lookup_tx, &lookup_rx, &weights, fillvalue)?
    } else {
        let ones = vec![1.0; weights.len()];
        let mut res = delay_and_sum(frame, &lookup_tx, &lookup_rx, &ones, fillvalue)?;

        let missing: Vec<f64> = weights.iter().map(|w| w - 1.0).collect();
        if missing.iter().any(|&w| w != 0.0) {
            let swapped_tx = scanline_lookup_times(&per_element_rx, &frame.tx)?;
            let swapped_rx = scanline_lookup_times(&per_element_tx, &frame.rx)?;
            let swapped = delay_and_sum(frame, &swapped_tx, &swapped_rx, &missing, fillvalue)?;
            for (r, s) in res.iter_mut().zip(swapped) {
                *r += s;
            }
        }
        res
    };
    Array3::from_shape_vec(grid.shape(), res).map_err(|e| SimError::processing(e.to_string()))
}

/// TFM of a contact inspection: direct paths only, at a single wave velocity.
pub fn contact_tfm(
    frame: &Frame,
    probe: &Probe,
    grid: &Grid,
    velocity: f64,
    fillvalue: Complex<f64>,
) -> Result<Array3<Complex<f64>>> {
    let leg = Leg::direct(Mode::Longitudinal, velocity);
    tfm_for_view(frame, probe, grid, &View::new(leg.clone(), leg), fillvalue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StateOfMatter;

    #[test]
    fn test_frame_shape_checks() {
        let time = Time::new(0.0, 1e-8, 10).unwrap();
        let scanlines = Array2::zeros((3, 10));
        assert!(Frame::new(scanlines.clone(), time, vec![0, 0, 1], vec![0, 1, 1]).is_ok());
        assert!(Frame::new(scanlines.clone(), time, vec![0, 0], vec![0, 1]).is_err());
        let short = Time::new(0.0, 1e-8, 9).unwrap();
        assert!(Frame::new(scanlines, short, vec![0, 0, 1], vec![0, 1, 1]).is_err());
    }

    #[test]
    fn test_interpolate() {
        let time = Time::new(1.0, 0.5, 3).unwrap();
        let data = ndarray::arr1(&[
            Complex::new(0.0, 0.0),
            Complex::new(2.0, 0.0),
            Complex::new(4.0, 2.0),
        ]);
        assert_eq!(interpolate(data.view(), &time, 1.25), Some(Complex::new(1.0, 0.0)));
        assert_eq!(interpolate(data.view(), &time, 2.0), Some(Complex::new(4.0, 2.0)));
        assert_eq!(interpolate(data.view(), &time, 0.99), None);
        assert_eq!(interpolate(data.view(), &time, 2.01), None);
        assert_eq!(interpolate(data.view(), &time, f64::NAN), None);
    }

    #[test]
    fn test_contact_lookup_times() {
        let elements = [[0.0, 0.0, 0.0], [3e-3, 0.0, 0.0]];
        let points = [[0.0, 0.0, 4e-3]];
        let times = contact_lookup_times(&elements, &points, 1000.0).unwrap();
        assert_eq!(times.dim(), (1, 2));
        assert!((times[[0, 0]] - 4e-6).abs() < 1e-15);
        assert!((times[[0, 1]] - 5e-6).abs() < 1e-15);
        assert!(contact_lookup_times(&elements, &points, 0.0).is_err());
    }

    #[test]
    fn test_scanline_lookup_times() {
        let per_element = ndarray::arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let gathered = scanline_lookup_times(&per_element, &[2, 0, 0]).unwrap();
        assert_eq!(gathered, ndarray::arr2(&[[3.0, 1.0, 1.0], [6.0, 4.0, 4.0]]));
        assert!(scanline_lookup_times(&per_element, &[3]).is_err());
    }

    #[test]
    fn test_skip_matches_mirror_image() {
        let wall: Arc<[Point]> = geometry::points_1d_wall_z(-5e-3, 5e-3, 10e-3, 1001).unwrap().into();
        let leg = Leg::skip([Mode::Longitudinal; 2], [1000.0; 2], wall);
        let elements = [[-1e-3, 0.0, 0.0]];
        let points = [[1e-3, 0.0, 5e-3]];
        let times = leg.lookup_times(&elements, &points).unwrap();

        // flat wall: shortest bounce is the straight line to the mirrored point
        let mirrored = [1e-3, 0.0, 15e-3];
        let expected = geometry::distance(&elements[0], &mirrored) / 1000.0;
        assert!((times[[0, 0]] - expected).abs() < 1e-11, "{} vs {}", times[[0, 0]], expected);
    }

    #[test]
    fn test_skip_mode_conversion_uses_both_velocities() {
        let wall: Arc<[Point]> = vec![[0.0, 0.0, 10e-3]].into();
        let elements = [[0.0, 0.0, 0.0]];
        let points = [[0.0, 0.0, 6e-3]];
        let lt = Leg::skip([Mode::Longitudinal, Mode::Transverse], [6000.0, 3000.0], wall);
        let times = lt.lookup_times(&elements, &points).unwrap();
        assert!((times[[0, 0]] - (10e-3 / 6000.0 + 4e-3 / 3000.0)).abs() < 1e-15);
        assert_eq!(lt.name(), "LT");
        assert_eq!(lt.reversed_name(), "TL");
    }

    #[test]
    fn test_skip_rejects_bad_input() {
        let empty: Arc<[Point]> = Vec::new().into();
        let leg = Leg::skip([Mode::Longitudinal; 2], [1000.0; 2], empty);
        assert!(leg.lookup_times(&[[0.0; 3]], &[[0.0; 3]]).is_err());

        let wall: Arc<[Point]> = vec![[0.0, 0.0, 1.0]].into();
        let leg = Leg::skip([Mode::Longitudinal; 2], [1000.0, -1.0], wall);
        assert!(leg.lookup_times(&[[0.0; 3]], &[[0.0; 3]]).is_err());
    }

    #[test]
    fn test_view_names_and_reversal() {
        let wall: Arc<[Point]> = vec![[0.0, 0.0, 1.0]].into();
        let ll = Leg::skip([Mode::Longitudinal; 2], [6300.0; 2], wall);
        let t = Leg::direct(Mode::Transverse, 3100.0);
        let view = View::new(ll, t);
        assert_eq!(view.name, "LL-T");
        assert!(!view.is_symmetric());
        let reversed = view.reversed();
        assert_eq!(reversed.name, "T-LL");
        assert_eq!(reversed.reversed(), view);
    }

    fn material(transverse_vel: Option<f64>, state_of_matter: StateOfMatter) -> MaterialConfig {
        MaterialConfig {
            longitudinal_vel: 6300.0,
            transverse_vel,
            density: None,
            state_of_matter,
            metadata: None,
        }
    }

    #[test]
    fn test_contact_views() {
        let backwall = geometry::points_1d_wall_z(-1e-3, 1e-3, 10e-3, 20).unwrap();

        let views = contact_views(&material(Some(3100.0), StateOfMatter::Solid), &backwall).unwrap();
        // legs L, T, LL, LT, TL, TT: 6 * 7 / 2 unordered pairs
        assert_eq!(views.len(), 21);
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        for name in ["L-L", "L-T", "T-T", "T-LL", "L-TL", "TT-TT"] {
            assert!(names.contains(&name), "missing {}", name);
        }
        // a view and its reverse image the same thing, only one is kept
        assert!(!names.contains(&"LL-T"));

        let fluid = contact_views(&material(None, StateOfMatter::Liquid), &backwall).unwrap();
        let names: Vec<String> = fluid.into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["L-L", "L-LL", "LL-LL"]);
    }
}

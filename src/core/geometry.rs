use crate::config::scenario::{GridConfig, WallConfig};
use crate::utils::error::{Result, SimError};

pub type Point = [f64; 3];

pub fn distance(a: &Point, b: &Point) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// Rotation about the y axis, `[[c, 0, s], [0, 1, 0], [-s, 0, c]]`.
pub fn rotate_y(p: &Point, angle_rad: f64) -> Point {
    let (s, c) = angle_rad.sin_cos();
    [c * p[0] + s * p[2], p[1], -s * p[0] + c * p[2]]
}

pub fn translate(p: &Point, v: &Point) -> Point {
    [p[0] + v[0], p[1] + v[1], p[2] + v[2]]
}

pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sum = points.iter().fold([0.0; 3], |acc, p| translate(&acc, p));
    Some([sum[0] / n, sum[1] / n, sum[2] / n])
}

/// `numpoints` evenly spaced points from `(xmin, 0, z)` to `(xmax, 0, z)`.
pub fn points_1d_wall_z(xmin: f64, xmax: f64, z: f64, numpoints: usize) -> Result<Vec<Point>> {
    if numpoints == 0 {
        return Err(SimError::processing("a wall needs at least one point"));
    }
    if numpoints == 1 {
        return Ok(vec![[xmin, 0.0, z]]);
    }
    let step = (xmax - xmin) / (numpoints - 1) as f64;
    Ok((0..numpoints)
        .map(|i| {
            // pin the last point to xmax exactly
            let x = if i == numpoints - 1 { xmax } else { xmin + i as f64 * step };
            [x, 0.0, z]
        })
        .collect())
}

pub fn wall_points(wall: &WallConfig) -> Result<Vec<Point>> {
    points_1d_wall_z(wall.xmin, wall.xmax, wall.z, wall.numpoints)
}

/// Largest number of points a grid may hold.
pub const MAX_GRID_POINTS: usize = 100_000_000;

fn axis_len(name: &str, min: f64, max: f64, pixel_size: f64) -> Result<usize> {
    if min > max {
        return Err(SimError::invalid_value(
            format!("grid.{}", name),
            format!("[{}, {}]", min, max),
            "Lower bound must not exceed upper bound",
        ));
    }
    if min == max {
        return Ok(1);
    }
    if !pixel_size.is_finite() || pixel_size <= 0.0 {
        return Err(SimError::invalid_value(
            "grid.pixel_size",
            pixel_size,
            "A non-degenerate grid needs a positive pixel size",
        ));
    }
    // counted in f64 first, a tiny pixel would saturate the cast
    let num = ((max - min) / pixel_size).round() + 1.0;
    if !num.is_finite() || num > MAX_GRID_POINTS as f64 {
        return Err(SimError::invalid_value(
            "grid.pixel_size",
            pixel_size,
            format!(
                "Gives {:e} samples along {}, at most {} grid points are supported",
                num, name, MAX_GRID_POINTS
            ),
        ));
    }
    Ok(num as usize)
}

/// Number of samples along x, y and z, without building the axes.
///
/// An axis with `min == max` gets a single sample; otherwise
/// `round((max - min) / pixel_size) + 1` samples starting at `min`.
pub fn grid_shape(config: &GridConfig) -> Result<(usize, usize, usize)> {
    let nx = axis_len("x", config.xmin, config.xmax, config.pixel_size)?;
    let ny = axis_len("y", config.ymin, config.ymax, config.pixel_size)?;
    let nz = axis_len("z", config.zmin, config.zmax, config.pixel_size)?;
    match nx.checked_mul(ny).and_then(|n| n.checked_mul(nz)) {
        Some(total) if total <= MAX_GRID_POINTS => Ok((nx, ny, nz)),
        _ => Err(SimError::invalid_value(
            "grid.pixel_size",
            config.pixel_size,
            format!(
                "A {}x{}x{} grid exceeds {} points",
                nx, ny, nz, MAX_GRID_POINTS
            ),
        )),
    }
}

fn axis(num: usize, min: f64, pixel_size: f64) -> Vec<f64> {
    if num == 1 {
        vec![min]
    } else {
        crate::core::ut::make_timevect(num, pixel_size, min)
    }
}

/// Regular imaging grid. Points are stored in C order: x slowest, z fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub pixel_size: f64,
}

impl Grid {
    /// See [`grid_shape`] for the number of samples per axis.
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        zmin: f64,
        zmax: f64,
        pixel_size: f64,
    ) -> Result<Self> {
        Self::from_config(&GridConfig {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
            pixel_size,
        })
    }

    pub fn from_config(config: &GridConfig) -> Result<Self> {
        let (nx, ny, nz) = grid_shape(config)?;
        Ok(Self {
            x: axis(nx, config.xmin, config.pixel_size),
            y: axis(ny, config.ymin, config.pixel_size),
            z: axis(nz, config.zmin, config.pixel_size),
            pixel_size: config.pixel_size,
        })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.x.len(), self.y.len(), self.z.len())
    }

    /// Bounded by [`MAX_GRID_POINTS`] at construction.
    pub fn numpoints(&self) -> usize {
        self.x.len() * self.y.len() * self.z.len()
    }

    pub fn unravel(&self, idx: usize) -> (usize, usize, usize) {
        let (_, ny, nz) = self.shape();
        (idx / (ny * nz), (idx / nz) % ny, idx % nz)
    }

    pub fn point(&self, idx: usize) -> Point {
        let (ix, iy, iz) = self.unravel(idx);
        [self.x[ix], self.y[iy], self.z[iz]]
    }

    pub fn to_points(&self) -> Vec<Point> {
        (0..self.numpoints()).map(|idx| self.point(idx)).collect()
    }

    /// Whether the point lies on the faces of the grid's bounding box, i.e.
    /// sits at either end of at least one axis with more than one sample.
    /// A single-point grid is its own box.
    pub fn is_on_rectbox(&self, idx: usize) -> bool {
        let (nx, ny, nz) = self.shape();
        if nx == 1 && ny == 1 && nz == 1 {
            return true;
        }
        let (ix, iy, iz) = self.unravel(idx);
        let at_edge = |i: usize, n: usize| n > 1 && (i == 0 || i == n - 1);
        at_edge(ix, nx) || at_edge(iy, ny) || at_edge(iz, nz)
    }

    pub fn xmin(&self) -> f64 {
        self.x[0]
    }

    pub fn xmax(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    pub fn zmin(&self) -> f64 {
        self.z[0]
    }

    pub fn zmax(&self) -> f64 {
        self.z[self.z.len() - 1]
    }
}

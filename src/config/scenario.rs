//! Scenario files for an ultrasonic forward simulation.
//!
//! A scenario describes one inspection: the array probe and where it sits,
//! the excitation, the couplant ("under" material) and the test block, one
//! scatterer, the two block walls and the imaging grid. Lengths are in
//! metres, velocities in m/s, densities in kg/m3, frequencies in Hz.
//!
//! ```yaml
//! probe:
//!   frequency: 5.e6
//!   numx: 64
//!   pitch_x: 0.63e-3
//!   numy: 1
//!   pitch_y: .nan
//!   dimensions: [0.53e-3, 15.e-3, .nan]
//! probe_location:
//!   ref_element: mean
//!   angle_deg: 0.
//!   standoff: -10.e-3
//! toneburst:
//!   num_cycles: 5
//! under_material:
//!   longitudinal_vel: 1480.
//!   density: 1000.
//!   state_of_matter: liquid
//! block_material:
//!   longitudinal_vel: 6320.
//!   transverse_vel: 3130.
//!   density: 2700.
//!   state_of_matter: solid
//! scatterer:
//!   location: {x: 0., z: 20.e-3}
//!   specs:
//!     kind: sdh
//!     radius: 0.5e-3
//! frontwall: {numpoints: 1000, xmin: -30.e-3, xmax: 30.e-3, z: 0.}
//! backwall: {numpoints: 1000, xmin: -30.e-3, xmax: 30.e-3, z: 40.e-3}
//! grid: {xmin: -25.e-3, xmax: 25.e-3, zmin: 0.1e-3, zmax: 39.9e-3, pixel_size: 0.25e-3}
//! ```

use crate::core::geometry;
use crate::domain::model::{Mode, ReferenceElement, StateOfMatter};
use crate::utils::error::{Result, SimError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub probe: ProbeConfig,
    pub probe_location: ProbeLocationConfig,
    pub toneburst: ToneburstConfig,
    pub under_material: MaterialConfig,
    pub block_material: MaterialConfig,
    pub scatterer: ScattererConfig,
    pub frontwall: WallConfig,
    pub backwall: WallConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub frequency: f64,
    pub numx: usize,
    pub pitch_x: f64,
    pub numy: usize,
    /// Meaningless for linear arrays, usually written `.nan`.
    #[serde(default)]
    pub pitch_y: Option<f64>,
    /// Element dimensions along x, y, z. Unknown entries are NaN.
    #[serde(default)]
    pub dimensions: Option<[f64; 3]>,
    /// Fractional -6 dB bandwidth.
    #[serde(default)]
    pub bandwidth: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeLocationConfig {
    pub ref_element: ReferenceElement,
    #[serde(default)]
    pub angle_deg: f64,
    /// Offset along z of the reference point; negative above the frontwall.
    #[serde(default)]
    pub standoff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToneburstConfig {
    pub num_cycles: u32,
    #[serde(default)]
    pub wrap: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialConfig {
    pub longitudinal_vel: f64,
    #[serde(default)]
    pub transverse_vel: Option<f64>,
    #[serde(default)]
    pub density: Option<f64>,
    pub state_of_matter: StateOfMatter,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl MaterialConfig {
    pub fn velocity(&self, mode: Mode) -> Option<f64> {
        match mode {
            Mode::Longitudinal => Some(self.longitudinal_vel),
            Mode::Transverse => self.transverse_vel,
        }
    }

    pub fn wavelength(&self, mode: Mode, frequency: f64) -> Option<f64> {
        self.velocity(mode).map(|v| v / frequency)
    }

    /// Acoustic impedance `rho * c`, if the density is known.
    pub fn impedance(&self, mode: Mode) -> Option<f64> {
        Some(self.density? * self.velocity(mode)?)
    }

    fn validate_as(&self, section: &str) -> Result<()> {
        validation::validate_positive(
            &format!("{}.longitudinal_vel", section),
            self.longitudinal_vel,
        )?;

        match (self.state_of_matter.is_fluid(), self.transverse_vel) {
            (false, None) => {
                return Err(SimError::MissingConfigError {
                    field: format!("{}.transverse_vel", section),
                })
            }
            (false, Some(vel)) => {
                validation::validate_positive(&format!("{}.transverse_vel", section), vel)?
            }
            (true, Some(vel)) => {
                return Err(SimError::invalid_value(
                    format!("{}.transverse_vel", section),
                    vel,
                    "Fluids do not support transverse waves",
                ))
            }
            (true, None) => {}
        }

        if let Some(density) = self.density {
            validation::validate_non_negative(&format!("{}.density", section), density)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn as_point(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScattererConfig {
    pub location: Location,
    #[serde(default)]
    pub angle_deg: f64,
    pub specs: ScattererSpecs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScattererSpecs {
    /// Side-drilled hole.
    Sdh { radius: f64 },
    Point,
    CrackCentre { crack_length: f64 },
}

impl ScattererSpecs {
    pub fn kind(&self) -> &'static str {
        match self {
            ScattererSpecs::Sdh { .. } => "sdh",
            ScattererSpecs::Point => "point",
            ScattererSpecs::CrackCentre { .. } => "crack_centre",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WallConfig {
    pub numpoints: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub z: f64,
}

impl WallConfig {
    fn validate_as(&self, section: &str) -> Result<()> {
        validation::validate_positive_number(&format!("{}.numpoints", section), self.numpoints, 1)?;
        validation::validate_interval(&format!("{}.x", section), self.xmin, self.xmax)?;
        validation::validate_finite(&format!("{}.z", section), self.z)?;
        if self.xmin < self.xmax && self.numpoints < 2 {
            return Err(SimError::invalid_value(
                format!("{}.numpoints", section),
                self.numpoints,
                "A wall with non-zero length needs at least 2 points",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub xmin: f64,
    pub xmax: f64,
    #[serde(default)]
    pub ymin: f64,
    #[serde(default)]
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    pub pixel_size: f64,
}

impl GridConfig {
    pub fn is_single_point(&self) -> bool {
        self.xmin == self.xmax && self.ymin == self.ymax && self.zmin == self.zmax
    }

    pub fn contains(&self, p: [f64; 3]) -> bool {
        (self.xmin..=self.xmax).contains(&p[0])
            && (self.ymin..=self.ymax).contains(&p[1])
            && (self.zmin..=self.zmax).contains(&p[2])
    }
}

const SCENARIO_EXTENSIONS: [&str; 3] = ["yaml", "yml", "toml"];

impl Scenario {
    /// Load a scenario; the format is chosen from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = validation::validate_extension("config", path, &SCENARIO_EXTENSIONS)?;
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Read {} bytes from {}", content.len(), path.display());
        match ext {
            "toml" => Self::from_toml_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(serde_yaml::from_str(&processed)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    /// Replace `${VAR}` with the value of the environment variable; unset
    /// variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SimError::ConfigError {
            message: format!("bad substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn numelements(&self) -> usize {
        self.probe.numx * self.probe.numy
    }

    /// Probe coupled through a fluid layer rather than in contact.
    pub fn is_immersion(&self) -> bool {
        self.under_material.state_of_matter.is_fluid() && self.probe_location.standoff != 0.0
    }

    fn validate_probe(&self) -> Result<()> {
        let probe = &self.probe;
        validation::validate_positive("probe.frequency", probe.frequency)?;
        validation::validate_positive_number("probe.numx", probe.numx, 1)?;
        validation::validate_positive_number("probe.numy", probe.numy, 1)?;
        if probe.numx > 1 {
            validation::validate_positive("probe.pitch_x", probe.pitch_x)?;
        }
        if probe.numy > 1 {
            let pitch_y = probe.pitch_y.ok_or_else(|| SimError::MissingConfigError {
                field: "probe.pitch_y".to_string(),
            })?;
            validation::validate_positive("probe.pitch_y", pitch_y)?;
        }
        if let Some(bandwidth) = probe.bandwidth {
            validation::validate_positive("probe.bandwidth", bandwidth)?;
            validation::validate_range("probe.bandwidth", bandwidth, 0.0, 2.0)?;
        }
        if let Some(dimensions) = probe.dimensions {
            for (axis, d) in ["x", "y", "z"].iter().zip(dimensions) {
                if !d.is_nan() {
                    validation::validate_non_negative(&format!("probe.dimensions.{}", axis), d)?;
                }
            }
        }

        let location = &self.probe_location;
        validation::validate_finite("probe_location.angle_deg", location.angle_deg)?;
        validation::validate_finite("probe_location.standoff", location.standoff)?;
        Ok(())
    }

    fn validate_grid(&self) -> Result<()> {
        let grid = &self.grid;
        validation::validate_interval("grid.x", grid.xmin, grid.xmax)?;
        validation::validate_interval("grid.y", grid.ymin, grid.ymax)?;
        validation::validate_interval("grid.z", grid.zmin, grid.zmax)?;
        if !(grid.is_single_point() && grid.pixel_size.is_nan()) {
            validation::validate_positive("grid.pixel_size", grid.pixel_size)?;
        }
        geometry::grid_shape(grid)?;
        Ok(())
    }

    fn validate_scatterer(&self) -> Result<()> {
        let scatterer = &self.scatterer;
        let loc = scatterer.location;
        validation::validate_finite("scatterer.location.x", loc.x)?;
        validation::validate_finite("scatterer.location.y", loc.y)?;
        validation::validate_finite("scatterer.location.z", loc.z)?;
        validation::validate_finite("scatterer.angle_deg", scatterer.angle_deg)?;
        match scatterer.specs {
            ScattererSpecs::Sdh { radius } => {
                validation::validate_positive("scatterer.specs.radius", radius)?
            }
            ScattererSpecs::CrackCentre { crack_length } => {
                validation::validate_positive("scatterer.specs.crack_length", crack_length)?
            }
            ScattererSpecs::Point => {}
        }
        Ok(())
    }

    /// Plausible but suspicious settings. Logged, never fatal.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let loc = self.scatterer.location;
        if !(self.frontwall.z < loc.z && loc.z < self.backwall.z) {
            warnings.push(format!(
                "scatterer depth {} m is outside the block [{}, {}]",
                loc.z, self.frontwall.z, self.backwall.z
            ));
        }
        if !self.grid.contains(loc.as_point()) {
            warnings.push(format!(
                "scatterer at ({}, {}, {}) is outside the imaging grid",
                loc.x, loc.y, loc.z
            ));
        }
        if self.probe_location.standoff > 0.0 {
            warnings.push(format!(
                "probe standoff {} m places the probe below the frontwall",
                self.probe_location.standoff
            ));
        }
        warnings
    }
}

impl Validate for Scenario {
    fn validate(&self) -> Result<()> {
        self.validate_probe()?;
        validation::validate_positive_number(
            "toneburst.num_cycles",
            self.toneburst.num_cycles as usize,
            1,
        )?;
        self.under_material.validate_as("under_material")?;
        self.block_material.validate_as("block_material")?;
        self.validate_scatterer()?;
        self.frontwall.validate_as("frontwall")?;
        self.backwall.validate_as("backwall")?;
        if self.frontwall.z >= self.backwall.z {
            return Err(SimError::invalid_value(
                "backwall.z",
                self.backwall.z,
                format!("Backwall must be deeper than the frontwall (z = {})", self.frontwall.z),
            ));
        }
        self.validate_grid()?;

        for warning in self.warnings() {
            tracing::warn!("⚠️  {}", warning);
        }
        Ok(())
    }
}

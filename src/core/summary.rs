use crate::config::scenario::Scenario;
use crate::core::geometry;
use crate::core::ut;
use crate::domain::model::{Capture, CaptureMethod, Mode};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Samples per period of the probe centre frequency used when sampling the
/// toneburst for export.
pub const SAMPLES_PER_PERIOD: f64 = 20.0;

/// Quantities derived from a scenario, written to `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub generated_at: DateTime<Utc>,
    pub numelements: usize,
    pub capture_method: CaptureMethod,
    pub numscanlines: usize,
    pub immersion: bool,
    pub grid_shape: [usize; 3],
    pub grid_numpoints: usize,
    pub frontwall_numpoints: usize,
    pub backwall_numpoints: usize,
    pub block_thickness: f64,
    /// Keyed `<material>.<mode>`, e.g. `block_material.L`.
    pub wavelengths: BTreeMap<String, f64>,
    pub sampling_frequency: f64,
    pub toneburst_duration: f64,
    pub scatterer_kind: String,
    pub scatterer_location: [f64; 3],
    pub warnings: Vec<String>,
}

impl ScenarioSummary {
    pub fn from_scenario(scenario: &Scenario, capture: Capture) -> Result<Self> {
        let (nx, ny, nz) = geometry::grid_shape(&scenario.grid)?;
        let numelements = scenario.numelements();
        let capture_method = CaptureMethod::from(capture);
        let (tx, _) = ut::capture_pairs(capture_method, numelements)?;

        let frequency = scenario.probe.frequency;
        let mut wavelengths = BTreeMap::new();
        for (name, material) in [
            ("under_material", &scenario.under_material),
            ("block_material", &scenario.block_material),
        ] {
            for mode in [Mode::Longitudinal, Mode::Transverse] {
                if let Some(wavelength) = material.wavelength(mode, frequency) {
                    wavelengths.insert(format!("{}.{}", name, mode.short_name()), wavelength);
                }
            }
        }

        Ok(Self {
            generated_at: Utc::now(),
            numelements,
            capture_method,
            numscanlines: tx.len(),
            immersion: scenario.is_immersion(),
            grid_shape: [nx, ny, nz],
            grid_numpoints: nx * ny * nz,
            frontwall_numpoints: scenario.frontwall.numpoints,
            backwall_numpoints: scenario.backwall.numpoints,
            block_thickness: scenario.backwall.z - scenario.frontwall.z,
            wavelengths,
            sampling_frequency: SAMPLES_PER_PERIOD * frequency,
            toneburst_duration: scenario.toneburst.num_cycles as f64 / frequency,
            scatterer_kind: scenario.scatterer.specs.kind().to_string(),
            scatterer_location: scenario.scatterer.location.as_point(),
            warnings: scenario.warnings(),
        })
    }

    pub fn log(&self) {
        tracing::info!(
            "🔊 Probe: {} elements, {} capture ({} scanlines), {}",
            self.numelements,
            self.capture_method,
            self.numscanlines,
            if self.immersion { "immersion" } else { "contact" }
        );
        tracing::info!(
            "🧱 Block: thickness {:.3} mm, walls sampled with {}/{} points",
            self.block_thickness * 1e3,
            self.frontwall_numpoints,
            self.backwall_numpoints
        );
        tracing::info!(
            "🗺️  Grid: {:?} ({} points)",
            self.grid_shape,
            self.grid_numpoints
        );
        for (key, wavelength) in &self.wavelengths {
            tracing::info!("   λ {} = {:.4} mm", key, wavelength * 1e3);
        }
        tracing::info!(
            "🎯 Scatterer: {} at ({:.2}, {:.2}, {:.2}) mm",
            self.scatterer_kind,
            self.scatterer_location[0] * 1e3,
            self.scatterer_location[1] * 1e3,
            self.scatterer_location[2] * 1e3
        );
    }
}

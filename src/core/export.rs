use crate::config::scenario::Scenario;
use crate::core::geometry::{self, Grid, Point};
use crate::core::probe::Probe;
use crate::core::summary::{ScenarioSummary, SAMPLES_PER_PERIOD};
use crate::core::{toneburst, ut};
use crate::domain::model::{CaptureMethod, ExportBundle};
use crate::domain::ports::{ConfigProvider, Exporter, Storage};
use crate::utils::error::{Result, SimError};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const ARCHIVE_NAME: &str = "scenario_export.zip";

#[derive(Debug, Serialize)]
struct PointRow {
    index: usize,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Serialize)]
struct ToneburstRow {
    time: f64,
    amplitude: f64,
    envelope: f64,
}

#[derive(Debug, Serialize)]
struct CaptureRow {
    scanline: usize,
    tx: usize,
    rx: usize,
    weight: f64,
}

fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| SimError::IoError(e.into_error()))
}

fn points_csv(points: &[Point]) -> Result<Vec<u8>> {
    to_csv(points.iter().enumerate().map(|(index, p)| PointRow {
        index,
        x: p[0],
        y: p[1],
        z: p[2],
    }))
}

/// Writes the geometry, excitation and acquisition table of a scenario.
pub struct ScenarioExporter<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    scenario: Scenario,
}

impl<S: Storage, C: ConfigProvider> ScenarioExporter<S, C> {
    pub fn new(storage: S, config: C, scenario: Scenario) -> Self {
        Self {
            storage,
            config,
            scenario,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    fn toneburst_csv(&self) -> Result<Vec<u8>> {
        let frequency = self.scenario.probe.frequency;
        let dt = 1.0 / (SAMPLES_PER_PERIOD * frequency);
        let signal = toneburst::make_toneburst(
            self.scenario.toneburst.num_cycles,
            frequency,
            dt,
            None,
            self.scenario.toneburst.wrap,
        )?;
        let envelope = ut::analytic_signal(&signal);
        let time = ut::make_timevect(signal.len(), dt, 0.0);

        to_csv(
            time.iter()
                .zip(&signal)
                .zip(&envelope)
                .map(|((&time, &amplitude), analytic)| ToneburstRow {
                    time,
                    amplitude,
                    envelope: analytic.norm(),
                }),
        )
    }

    fn capture_csv(&self) -> Result<Vec<u8>> {
        let method = CaptureMethod::from(self.config.capture());
        let (tx, rx) = ut::capture_pairs(method, self.scenario.numelements())?;
        let weights = ut::default_scanline_weights(&tx, &rx)?;
        to_csv(
            tx.iter()
                .zip(&rx)
                .zip(&weights)
                .enumerate()
                .map(|(scanline, ((&tx, &rx), &weight))| CaptureRow {
                    scanline,
                    tx,
                    rx,
                    weight,
                }),
        )
    }

    fn archive(bundle: &ExportBundle) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for artifact in &bundle.artifacts {
            zip.start_file::<_, ()>(artifact.name.as_str(), FileOptions::default())?;
            zip.write_all(&artifact.data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl<S: Storage, C: ConfigProvider> Exporter for ScenarioExporter<S, C> {
    fn build(&self) -> Result<ExportBundle> {
        let mut bundle = ExportBundle::default();

        let probe = Probe::from_scenario(&self.scenario)?;
        bundle.push("probe_elements.csv", points_csv(&probe.locations)?);

        let frontwall = geometry::wall_points(&self.scenario.frontwall)?;
        bundle.push("frontwall.csv", points_csv(&frontwall)?);
        let backwall = geometry::wall_points(&self.scenario.backwall)?;
        bundle.push("backwall.csv", points_csv(&backwall)?);

        let grid = Grid::from_config(&self.scenario.grid)?;
        bundle.push("grid.csv", points_csv(&grid.to_points())?);

        bundle.push("toneburst.csv", self.toneburst_csv()?);
        bundle.push("capture.csv", self.capture_csv()?);

        let summary = ScenarioSummary::from_scenario(&self.scenario, self.config.capture())?;
        bundle.push("summary.json", serde_json::to_vec_pretty(&summary)?);

        tracing::debug!(
            "Built {} artifacts ({} bytes)",
            bundle.artifacts.len(),
            bundle.total_bytes()
        );
        Ok(bundle)
    }

    fn write(&self, bundle: &ExportBundle) -> Result<String> {
        if self.config.archive() {
            let data = Self::archive(bundle)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", data.len());
            self.storage.write_file(ARCHIVE_NAME, &data)?;
            return Ok(self.storage.describe(ARCHIVE_NAME));
        }

        for artifact in &bundle.artifacts {
            tracing::debug!("Writing {} ({} bytes)", artifact.name, artifact.data.len());
            self.storage.write_file(&artifact.name, &artifact.data)?;
        }
        Ok(self.storage.describe(""))
    }
}

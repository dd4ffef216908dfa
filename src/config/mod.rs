pub mod cli;
pub mod scenario;

pub use crate::domain::model::Capture;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub use scenario::Scenario;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, clap::Parser)]
#[command(name = "utsim")]
#[command(about = "Validate an ultrasonic NDT scenario and export its geometry and excitation")]
pub struct CliConfig {
    /// Path to the scenario file (.yaml, .yml or .toml)
    #[arg(short, long, default_value = "scenario.yaml")]
    pub config: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "hmc")]
    pub capture: Capture,

    /// Write a single zip archive instead of loose files
    #[arg(long)]
    pub archive: bool,

    /// Validate and summarise the scenario without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Log CPU and memory usage between phases")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn capture(&self) -> Capture {
        self.capture
    }

    fn archive(&self) -> bool {
        self.archive
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config", &self.config)?;
        validation::validate_path("output_path", &self.output_path)
    }
}

/// Export settings for library callers that do not go through the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    pub output_path: String,
    pub capture: Capture,
    pub archive: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            capture: Capture::Hmc,
            archive: false,
        }
    }
}

impl ConfigProvider for ExportOptions {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn capture(&self) -> Capture {
        self.capture
    }

    fn archive(&self) -> bool {
        self.archive
    }
}

impl Validate for ExportOptions {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_path", &self.output_path)
    }
}

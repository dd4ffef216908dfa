pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
pub use crate::config::{ExportOptions, Scenario};
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::core::{engine::ExportEngine, export::ScenarioExporter, probe::Probe};
pub use crate::utils::error::{Result, SimError};

use serde::{Deserialize, Serialize};

/// Wave mode in an isotropic material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Longitudinal,
    Transverse,
}

impl Mode {
    pub fn short_name(&self) -> &'static str {
        match self {
            Mode::Longitudinal => "L",
            Mode::Transverse => "T",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateOfMatter {
    Solid,
    Liquid,
    Gas,
}

impl StateOfMatter {
    /// Fluids carry no shear waves.
    pub fn is_fluid(&self) -> bool {
        !matches!(self, StateOfMatter::Solid)
    }
}

/// Which point of the probe is used as its origin when positioning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceElement {
    /// Centre of the first element.
    First,
    /// Barycentre of all elements.
    Mean,
    /// Centre of the last element.
    Last,
    /// Outer edge of the last element along x, half a pitch past its centre.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Fmc,
    Hmc,
    Unsupported,
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptureMethod::Fmc => "fmc",
            CaptureMethod::Hmc => "hmc",
            CaptureMethod::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Acquisition scheme used for the exported capture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Capture {
    Fmc,
    Hmc,
}

impl From<Capture> for CaptureMethod {
    fn from(capture: Capture) -> Self {
        match capture {
            Capture::Fmc => CaptureMethod::Fmc,
            Capture::Hmc => CaptureMethod::Hmc,
        }
    }
}

/// A named file produced by the exporter.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub artifacts: Vec<Artifact>,
}

impl ExportBundle {
    pub fn push(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.artifacts.push(Artifact {
            name: name.into(),
            data,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn total_bytes(&self) -> usize {
        self.artifacts.iter().map(|a| a.data.len()).sum()
    }
}

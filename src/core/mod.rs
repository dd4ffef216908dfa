pub mod engine;
pub mod export;
pub mod geometry;
pub mod probe;
pub mod summary;
pub mod tfm;
pub mod toneburst;
pub mod ut;

pub use crate::domain::model::{Artifact, ExportBundle};
pub use crate::domain::ports::{ConfigProvider, Exporter, Storage};
pub use crate::utils::error::Result;

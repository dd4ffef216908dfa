use crate::domain::model::{Capture, ExportBundle};
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
    /// Human readable location of `path`, used in log lines and CLI output.
    fn describe(&self, path: &str) -> String;
}

/// Turns a loaded scenario into a set of files.
pub trait Exporter {
    fn build(&self) -> Result<ExportBundle>;
    fn write(&self, bundle: &ExportBundle) -> Result<String>;
}

pub trait ConfigProvider {
    fn output_path(&self) -> &str;
    fn capture(&self) -> Capture;
    fn archive(&self) -> bool;
}

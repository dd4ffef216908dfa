use crate::domain::ports::Exporter;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct ExportEngine<E: Exporter> {
    exporter: E,
    monitor: SystemMonitor,
}

impl<E: Exporter> ExportEngine<E> {
    pub fn new(exporter: E) -> Self {
        Self::new_with_monitoring(exporter, false)
    }

    pub fn new_with_monitoring(exporter: E, monitor_enabled: bool) -> Self {
        Self {
            exporter,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Build every artifact, then write them. Returns where they went.
    pub fn run(&self) -> Result<String> {
        tracing::info!("Building scenario artifacts...");
        let bundle = self.exporter.build()?;
        tracing::info!(
            "Built {} artifacts: {}",
            bundle.artifacts.len(),
            bundle.names().join(", ")
        );
        self.monitor.log_stats("Build");

        tracing::info!("Writing artifacts...");
        let location = self.exporter.write(&bundle)?;
        self.monitor.log_stats("Write");
        self.monitor.log_final_stats();

        Ok(location)
    }
}

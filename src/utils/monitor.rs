//! CPU and memory of the current process, logged after each export phase.
//! Without the `cli` feature, or when disabled, every call is a no-op.

#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    /// Share of the machine's total memory.
    pub rss_percent: f32,
    pub peak_rss_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_rss_mb: u64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn for_current_process() -> Option<Self> {
        match sysinfo::get_current_pid() {
            Ok(pid) => {
                let mut system = System::new_with_specifics(RefreshKind::everything());
                system.refresh_all();
                Some(Self {
                    system,
                    pid,
                    peak_rss_mb: 0,
                })
            }
            Err(e) => {
                tracing::warn!("Process monitoring unavailable: {}", e);
                None
            }
        }
    }

    fn sample(&mut self, elapsed: Duration) -> Option<ResourceSample> {
        self.system.refresh_all();
        let total_mb = self.system.total_memory() / 1024 / 1024;
        let process = self.system.process(self.pid)?;
        let rss_mb = process.memory() / 1024 / 1024;
        self.peak_rss_mb = self.peak_rss_mb.max(rss_mb);

        Some(ResourceSample {
            cpu_percent: process.cpu_usage(),
            rss_mb,
            rss_percent: if total_mb > 0 {
                rss_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_rss_mb: self.peak_rss_mb,
            elapsed,
        })
    }
}

pub struct SystemMonitor {
    started: Instant,
    #[cfg(feature = "cli")]
    sampler: Option<Mutex<Sampler>>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(not(feature = "cli"))]
        let _ = enabled;
        Self {
            started: Instant::now(),
            #[cfg(feature = "cli")]
            sampler: enabled
                .then(Sampler::for_current_process)
                .flatten()
                .map(Mutex::new),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[cfg(feature = "cli")]
    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    #[cfg(not(feature = "cli"))]
    pub fn is_enabled(&self) -> bool {
        false
    }

    #[cfg(feature = "cli")]
    pub fn sample(&self) -> Option<ResourceSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        sampler.sample(self.elapsed())
    }

    #[cfg(not(feature = "cli"))]
    pub fn sample(&self) -> Option<ResourceSample> {
        None
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                sample.cpu_percent,
                sample.rss_mb,
                sample.rss_percent,
                sample.peak_rss_mb,
                sample.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 Export finished in {:?}, peak memory {}MB",
                sample.elapsed,
                sample.peak_rss_mb
            );
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::default();
        assert!(!monitor.is_enabled());
        assert!(monitor.sample().is_none());
        monitor.log_stats("noop");
        monitor.log_final_stats();
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_peak_memory_never_decreases() {
        let monitor = SystemMonitor::new(true);
        let first = monitor.sample();
        let second = monitor.sample();
        if let (Some(first), Some(second)) = (first, second) {
            assert!(second.peak_rss_mb >= first.peak_rss_mb);
            assert!(second.peak_rss_mb >= second.rss_mb);
            assert!(second.elapsed >= first.elapsed);
        }
    }
}

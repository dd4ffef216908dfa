use clap::Parser;
use utsim::core::summary::ScenarioSummary;
use utsim::utils::{logger, validation::Validate};
use utsim::{CliConfig, ExportEngine, LocalStorage, Scenario, ScenarioExporter};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting utsim");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("📁 Loading scenario from: {}", config.config);
    let scenario = match Scenario::from_file(&config.config).and_then(|s| s.validate().map(|_| s)) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!("❌ Scenario rejected: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            // nothing to export without a scenario
            std::process::exit(e.severity().exit_code().max(1));
        }
    };
    tracing::info!("✅ Scenario loaded and validated successfully");

    let summary = ScenarioSummary::from_scenario(&scenario, config.capture)?;
    summary.log();

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let monitor_enabled = config.monitor;
    let exporter = ScenarioExporter::new(storage, config, scenario);
    let engine = ExportEngine::new_with_monitoring(exporter, monitor_enabled);

    match engine.run() {
        Ok(location) => {
            tracing::info!("✅ Export completed successfully!");
            println!("✅ Export completed successfully!");
            println!("📁 Output saved to: {}", location);
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

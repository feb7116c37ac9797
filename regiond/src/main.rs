mod config;
mod logging;
mod metrics;

use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "regiond", about = "Country-prefix routing for storefront traffic")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the region router and its admin listener
    Run(ConfigArgs),
    /// Load and validate a config file, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

fn load_config(path: &std::path::Path) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::ValidateConfig(args) => {
            load_config(&args.config_file_path);
            println!("Config is valid");
        }
        CliCommand::Run(args) => {
            let config = load_config(&args.config_file_path);
            let _logging = logging::init(config.common.logging.as_ref());

            if let Err(e) = metrics::init(config.common.metrics.as_ref()) {
                tracing::error!(error = %e, "Failed to initialize metrics");
                process::exit(1);
            }

            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build tokio runtime");
                    process::exit(1);
                }
            };

            tracing::info!("Starting region router");
            if let Err(e) = runtime.block_on(region_router::run(config.region_router)) {
                tracing::error!(error = %e, "Region router exited with error");
                process::exit(1);
            }
        }
    }
}

mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(about = "Relays attendance log entries into a Google Sheet")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the log-sync HTTP service
    Run(ConfigArgs),
    /// Load and validate the config file, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, default_value = "relay.yaml")]
    config: PathBuf,
}

fn load_config(args: &ConfigArgs) -> config::Config {
    match config::Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {e}", args.config.display());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        CliCommand::CheckConfig(args) => {
            let config = load_config(args);
            if let Err(e) = config.log_sync.validate() {
                eprintln!("Invalid config: {e}");
                process::exit(1);
            }
            println!("{} is valid", args.config.display());
        }
        CliCommand::Run(args) => {
            let config = load_config(args);
            let _sentry_guard = observability::init_logging(config.common.logging.as_ref());
            if let Some(metrics_config) = &config.common.metrics {
                if let Err(e) = observability::init_metrics(metrics_config) {
                    tracing::error!(error = %e, "Could not start statsd exporter");
                }
            }

            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(error = %e, "Could not start tokio runtime");
                    process::exit(1);
                }
            };

            tracing::info!("Starting log-sync");
            if let Err(e) = runtime.block_on(log_sync::run(config.log_sync)) {
                tracing::error!(error = %e, "log-sync stopped");
                process::exit(1);
            }
        }
    }
}

use clap::Parser;
use colored::*;
use config_engine::RealtimeConfig;
use tracing::info;

use ops_cli::{channels, print_channels, print_replay, print_summary, replay, watch, Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = RealtimeConfig::load(args.config.as_deref())?;
    if args.verbose {
        config.logging.log_level = "debug".to_string();
    }
    logger_redacted::init_tracing(&config.logging)?;

    match args.command {
        Command::Channels { tenant, json } => {
            let rows = channels(&config, &tenant);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_channels(&rows);
            }
        }
        Command::Replay { tenant, events } => {
            let report = replay(&config, tenant, &events).await?;
            print_replay(&report);
        }
        Command::Watch { tenant } => {
            info!("🏥 {} {}", "Watching realtime changes for".bright_cyan(), tenant);
            let summaries = watch(&config, tenant, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                }
            })
            .await?;
            for summary in &summaries {
                print_summary(summary);
            }
        }
        Command::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

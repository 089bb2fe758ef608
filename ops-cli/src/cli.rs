// Command line surface of `hims-live`
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use events_bus::TenantId;

#[derive(Parser, Debug)]
#[command(name = "hims-live")]
#[command(about = "Inspect and replay tenant-scoped realtime sessions")]
#[command(version)]
pub struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, global = true, env = "HIMS_LIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the channels a session for this tenant would open
    Channels {
        #[arg(long, value_parser = parse_tenant)]
        tenant: TenantId,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Replay a JSON Lines file of change events through a full session
    Replay {
        #[arg(long, value_parser = parse_tenant)]
        tenant: TenantId,

        /// One change message per line
        #[arg(long)]
        events: PathBuf,
    },

    /// Attach to the configured transport and print notifications until Ctrl-C
    Watch {
        #[arg(long, value_parser = parse_tenant)]
        tenant: TenantId,
    },

    /// Print the effective configuration as YAML
    Config,
}

pub fn parse_tenant(raw: &str) -> Result<TenantId, String> {
    TenantId::new(raw).ok_or_else(|| "tenant id must not be blank".to_string())
}

//! Operations CLI for HIMS Live realtime sessions
//!
//! The `hims-live` binary is a thin shell over this library:
//!
//! - **channels**: show the tenant-scoped channels a session would open
//! - **replay**: run a full session on the in-memory transport against a
//!   JSON Lines file of change events and report what the dashboard saw
//! - **watch**: attach to the configured transport and print notifications
//!   until interrupted
//! - **config**: print the effective configuration
//!
//! # Example Usage
//!
//! ```bash
//! hims-live channels --tenant hosp-123
//! hims-live replay --tenant hosp-123 --events changes.jsonl
//! HIMS_LIVE_TRANSPORT__KIND=nats hims-live watch --tenant hosp-123
//! ```

pub mod cli;
pub mod commands;
pub mod console;

pub use cli::*;
pub use commands::*;
pub use console::*;

//! Tracing setup with PHI redaction for HIMS Live
//!
//! Change events carry patient records. Anything that ends up in a log line
//! goes through [`PiiRedactor`] first so identifiers like e-mail addresses,
//! phone numbers, SSNs and MRNs never reach the log sink in clear text.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{PiiRedactor, RedactionConfig};
//!
//! let redactor = PiiRedactor::new(RedactionConfig {
//!     hash_for_correlation: false,
//!     ..Default::default()
//! });
//! let line = redactor.redact("Call (555) 123-4567 about MRN123456");
//! assert!(!line.contains("123-4567"));
//! assert!(!line.contains("MRN123456"));
//! ```

pub mod config;
pub mod init;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use init::*;
pub use redactor::*;

//! Common error handling utilities for HIMS Live
//!
//! Every crate in the workspace defines its own `thiserror` enum for the
//! failures it can produce and converts into [`HimsError`] where errors cross
//! a crate boundary (the CLI, configuration loading, transport setup).
//!
//! # Error Categories
//!
//! - **Transport**: realtime backend connection and channel errors
//! - **Subscription**: channel open/close bookkeeping errors
//! - **Config**: configuration loading and validation errors
//! - **Validation**: malformed identifiers, inputs and change-event payloads
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ErrorContext, HimsError};
//!
//! fn parse_tenant(raw: &str) -> Result<String, HimsError> {
//!     if raw.trim().is_empty() {
//!         return Err(HimsError::ValidationError(format!(
//!             "{}: tenant id cannot be empty",
//!             codes::validation::MISSING_TENANT
//!         )));
//!     }
//!     Ok(raw.to_string())
//! }
//!
//! let ctx = ErrorContext::new().with_tenant_id("hosp-123".to_string());
//! assert!(parse_tenant("").is_err());
//! assert_eq!(ctx.tenant_id.as_deref(), Some("hosp-123"));
//! ```

pub mod codes;
pub mod context;
pub mod types;

pub use context::*;
pub use types::*;

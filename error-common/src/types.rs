use thiserror::Error;

use crate::context::ErrorContext;

/// Workspace-wide error enum
#[derive(Error, Debug)]
pub enum HimsError {
    /// Realtime backend connection errors
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Channel open/close errors
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error carrying structured context
    #[error("{source}")]
    WithContext {
        #[source]
        source: Box<HimsError>,
        context: ErrorContext,
    },

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HimsError {
    /// Attach structured context to this error
    pub fn with_context(self, context: ErrorContext) -> Self {
        HimsError::WithContext {
            source: Box::new(self),
            context,
        }
    }

    /// Context attached via [`HimsError::with_context`], if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            HimsError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Result type alias for HIMS Live operations
pub type Result<T> = std::result::Result<T, HimsError>;

/// Log an error with its context at `error` level
pub fn log_error(context: &str, error: &HimsError) {
    match error.context() {
        Some(ctx) => tracing::error!(
            context = context,
            tenant_id = ctx.tenant_id.as_deref().unwrap_or("-"),
            table = ctx.table.as_deref().unwrap_or("-"),
            error = %error,
            "HIMS Live error occurred"
        ),
        None => tracing::error!(context = context, error = %error, "HIMS Live error occurred"),
    }
}

use error_common::codes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Realtime broker connection failed: {0}")]
    BrokerConnectionError(String),

    #[error("Failed to open channel on {table}: {reason}")]
    ChannelOpenFailed { table: &'static str, reason: String },

    #[error("Failed to close channel {channel_id}: {reason}")]
    ChannelCloseFailed { channel_id: String, reason: String },

    #[error("Unknown watched table: {0}")]
    UnknownTable(String),

    #[error("Invalid event format: {0}")]
    InvalidEventFormat(String),
}

impl RealtimeError {
    /// Stable error code for log correlation
    pub fn code(&self) -> &'static str {
        match self {
            RealtimeError::BrokerConnectionError(_) => codes::realtime::CONNECTION_FAILED,
            RealtimeError::ChannelOpenFailed { .. } => codes::realtime::CHANNEL_OPEN_FAILED,
            RealtimeError::ChannelCloseFailed { .. } => codes::realtime::CHANNEL_CLOSE_FAILED,
            RealtimeError::UnknownTable(_) | RealtimeError::InvalidEventFormat(_) => {
                codes::realtime::MALFORMED_EVENT
            }
        }
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::InvalidEventFormat(err.to_string())
    }
}

impl From<RealtimeError> for error_common::HimsError {
    fn from(err: RealtimeError) -> Self {
        match err {
            RealtimeError::BrokerConnectionError(_) => {
                error_common::HimsError::TransportError(err.to_string())
            }
            RealtimeError::ChannelOpenFailed { .. } | RealtimeError::ChannelCloseFailed { .. } => {
                error_common::HimsError::SubscriptionError(err.to_string())
            }
            RealtimeError::UnknownTable(_) | RealtimeError::InvalidEventFormat(_) => {
                error_common::HimsError::ValidationError(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RealtimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::HimsError;

    #[test]
    fn test_open_failure_maps_to_subscription_error() {
        let err = RealtimeError::ChannelOpenFailed {
            table: "lab_orders",
            reason: "timeout".to_string(),
        };
        assert_eq!(err.code(), codes::realtime::CHANNEL_OPEN_FAILED);

        let hims: HimsError = err.into();
        assert!(matches!(hims, HimsError::SubscriptionError(_)));
        assert_eq!(
            hims.to_string(),
            "Subscription error: Failed to open channel on lab_orders: timeout"
        );
    }

    #[test]
    fn test_malformed_payload_code() {
        let err: RealtimeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), codes::realtime::MALFORMED_EVENT);
    }
}

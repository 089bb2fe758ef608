// Standardized error codes for HIMS Live

pub mod validation {
    pub const MISSING_TENANT: &str = "VALIDATION_1001";
}

pub mod realtime {
    pub const CONNECTION_FAILED: &str = "REALTIME_2001";
    pub const CHANNEL_OPEN_FAILED: &str = "REALTIME_2002";
    pub const CHANNEL_CLOSE_FAILED: &str = "REALTIME_2003";
    pub const MALFORMED_EVENT: &str = "REALTIME_2004";
}

pub mod config {
    pub const SOURCE_UNREADABLE: &str = "CONFIG_3001";
    pub const PARSE_FAILED: &str = "CONFIG_3002";
    pub const VALIDATION_FAILED: &str = "CONFIG_3003";
}

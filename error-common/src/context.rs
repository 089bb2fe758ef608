use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error context information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub tenant_id: Option<String>,
    pub channel_id: Option<String>,
    pub table: Option<String>,
    pub additional: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant_id(mut self, tenant_id: String) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_channel_id(mut self, channel_id: String) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    pub fn with_table(mut self, table: String) -> Self {
        self.table = Some(table);
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }
}

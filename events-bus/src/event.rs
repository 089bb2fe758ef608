//! Change events delivered by the realtime backend

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::WatchedEntity;
use crate::error::{RealtimeError, Result};

/// Column values of one row
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One insert/update/delete on a watched table
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub entity: WatchedEntity,
    pub new_record: Option<Record>,
    pub old_record: Option<Record>,
}

impl ChangeEvent {
    pub fn insert(entity: WatchedEntity, new_record: Record) -> Self {
        Self {
            kind: ChangeKind::Insert,
            entity,
            new_record: Some(new_record),
            old_record: None,
        }
    }

    pub fn update(entity: WatchedEntity, old_record: Option<Record>, new_record: Record) -> Self {
        Self {
            kind: ChangeKind::Update,
            entity,
            new_record: Some(new_record),
            old_record,
        }
    }

    pub fn delete(entity: WatchedEntity, old_record: Record) -> Self {
        Self {
            kind: ChangeKind::Delete,
            entity,
            new_record: None,
            old_record: Some(old_record),
        }
    }

    /// Field from the new record, falling back to the old one
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.new_record
            .as_ref()
            .and_then(|record| record.get(name))
            .or_else(|| self.old_record.as_ref().and_then(|record| record.get(name)))
    }

    /// Tenant the row belongs to, read from `tenant_field`
    pub fn tenant(&self, tenant_field: &str) -> Option<&str> {
        self.field(tenant_field).and_then(Value::as_str)
    }

    /// The record worth logging: new row when present, otherwise the old one
    pub fn primary_record(&self) -> Option<&Record> {
        self.new_record.as_ref().or(self.old_record.as_ref())
    }

    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let message: ChangeMessage = serde_json::from_slice(payload)?;
        Self::try_from(message)
    }

    pub fn to_message(&self) -> ChangeMessage {
        ChangeMessage {
            event_kind: self.kind,
            table: self.entity.table().to_string(),
            new_record: self.new_record.clone(),
            old_record: self.old_record.clone(),
        }
    }
}

/// Wire shape: `{ eventKind, table, newRecord?, oldRecord? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMessage {
    pub event_kind: ChangeKind,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_record: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Record>,
}

impl TryFrom<ChangeMessage> for ChangeEvent {
    type Error = RealtimeError;

    fn try_from(message: ChangeMessage) -> Result<Self> {
        let entity = WatchedEntity::from_table(&message.table)
            .ok_or_else(|| RealtimeError::UnknownTable(message.table.clone()))?;

        let shape_ok = match message.event_kind {
            ChangeKind::Insert | ChangeKind::Update => message.new_record.is_some(),
            ChangeKind::Delete => message.old_record.is_some(),
        };
        if !shape_ok {
            return Err(RealtimeError::InvalidEventFormat(format!(
                "{:?} on {} is missing its record",
                message.event_kind, message.table
            )));
        }

        Ok(Self {
            kind: message.event_kind,
            entity,
            new_record: message.new_record,
            old_record: message.old_record,
        })
    }
}

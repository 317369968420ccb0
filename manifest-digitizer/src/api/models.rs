//! Backend entity and response envelope types
//!
//! The backend is inconsistent about identifier casing (`ID` on some
//! entities, `id` on others). Every payload that crosses the client
//! boundary is canonicalized into [`Entity`] / [`CreatedRecord`] so nothing
//! downstream has to look at both keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier keys in lookup order
const ID_KEYS: [&str; 2] = ["ID", "id"];

/// Backend record identifier (numeric on every known collection, but
/// accepted as text too)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Read the identifier from a record, checking both casings
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        ID_KEYS
            .iter()
            .filter_map(|key| record.get(*key))
            .find_map(Self::from_json)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) if !s.trim().is_empty() => Some(EntityId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EntityId::Int(i) => Value::from(*i),
            EntityId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(i) => write!(f, "{}", i),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Reference entity collections held in the lookup cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vessel,
    Person,
    WasteType,
    SystemUser,
}

impl EntityKind {
    /// Collection segment in the API path
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Vessel => "vessels",
            EntityKind::Person => "persons",
            EntityKind::WasteType => "wasteTypes",
            EntityKind::SystemUser => "systemUsers",
        }
    }

    /// Field carrying the display name in list responses
    pub fn name_field(&self) -> &'static str {
        match self {
            EntityKind::Vessel => "VesselName",
            EntityKind::Person => "Name",
            EntityKind::WasteType => "typeName",
            EntityKind::SystemUser => "FullName",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Vessel => "vessel",
            EntityKind::Person => "person",
            EntityKind::WasteType => "waste type",
            EntityKind::SystemUser => "system user",
        }
    }
}

/// A reference entity as listed by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Remaining backend fields, untouched
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Canonicalize one list entry. Entries without a name or an
    /// identifier cannot be looked up or referenced and yield `None`.
    pub fn from_json(kind: EntityKind, value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let name = record.get(kind.name_field())?.as_str()?.to_string();
        let id = EntityId::from_record(record)?;

        let fields = record
            .iter()
            .filter(|(key, _)| !ID_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self { id, name, fields })
    }
}

/// Parse a `{data: [...]}` list envelope into entities
pub fn parse_entity_list(kind: EntityKind, response: &Value) -> Vec<Entity> {
    let Some(items) = response.get("data").and_then(Value::as_array) else {
        log::warn!(
            "List response for {} has no data array",
            kind.collection()
        );
        return Vec::new();
    };

    let mut entities = Vec::with_capacity(items.len());
    for item in items {
        match Entity::from_json(kind, item) {
            Some(entity) => entities.push(entity),
            None => log::warn!(
                "Skipping {} without '{}' or identifier: {}",
                kind.label(),
                kind.name_field(),
                item
            ),
        }
    }
    entities
}

/// The `data` object of a successful create response
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRecord {
    /// `None` when the backend returned neither `ID` nor `id`
    pub id: Option<EntityId>,
    pub data: Map<String, Value>,
}

/// Why a create request did not produce a record
#[derive(Debug, Clone, PartialEq)]
pub enum CreateFailure {
    /// Transport error, non-2xx status or undecodable body
    NoResponse,
    /// The backend answered without `success: true`
    Rejected(Value),
    /// `success: true` but no `data` object
    MissingData,
}

impl fmt::Display for CreateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateFailure::NoResponse => write!(f, "no response from backend"),
            CreateFailure::Rejected(body) => write!(f, "backend rejected request: {}", body),
            CreateFailure::MissingData => write!(f, "response carried no data"),
        }
    }
}

impl std::error::Error for CreateFailure {}

/// Interpret a `{success, data}` create envelope
pub fn parse_create_response(response: Option<Value>) -> Result<CreatedRecord, CreateFailure> {
    let response = response.ok_or(CreateFailure::NoResponse)?;

    if response.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(CreateFailure::Rejected(response));
    }

    let data = response
        .get("data")
        .and_then(Value::as_object)
        .cloned()
        .ok_or(CreateFailure::MissingData)?;

    Ok(CreatedRecord {
        id: EntityId::from_record(&data),
        data,
    })
}

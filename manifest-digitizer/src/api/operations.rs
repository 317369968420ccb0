//! Operations against the compliance backend
//!
//! Every request the digitizer issues is one of these, so the full API
//! surface lives in a single place.

use serde_json::Value;
use std::fmt;

use super::models::EntityKind;

/// HTTP verbs the backend client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Collections that accept create requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Persons,
    Vessels,
    Compliances,
    Wastes,
}

impl Collection {
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Persons => "/persons",
            Collection::Vessels => "/vessels",
            Collection::Compliances => "/compliances",
            Collection::Wastes => "/wastes",
        }
    }
}

/// A single request against the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Page through a reference collection
    List {
        kind: EntityKind,
        offset: usize,
        limit: usize,
    },
    /// Create a new record
    Create {
        collection: Collection,
        /// Record data as JSON
        data: Value,
    },
}

impl Operation {
    pub fn list(kind: EntityKind, offset: usize, limit: usize) -> Self {
        Self::List {
            kind,
            offset,
            limit,
        }
    }

    pub fn create(collection: Collection, data: Value) -> Self {
        Self::Create { collection, data }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::List { .. } => Method::Get,
            Operation::Create { .. } => Method::Post,
        }
    }

    /// Path relative to the `/api` root
    pub fn path(&self) -> String {
        match self {
            Operation::List {
                kind,
                offset,
                limit,
            } => format!("/{}/{}/{}", kind.collection(), offset, limit),
            Operation::Create { collection, .. } => collection.path().to_string(),
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Operation::List { .. } => None,
            Operation::Create { data, .. } => Some(data),
        }
    }
}

//! Manifest input: CSV rows and the payloads built from them

pub mod payload;
pub mod row;

pub use payload::{ComplianceRequest, ManifestPayload, WasteCategory, WasteRequest};
pub use row::{ManifestFile, ManifestRecord, RawRow};

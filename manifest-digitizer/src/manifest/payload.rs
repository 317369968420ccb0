//! Manifest payloads and the request bodies derived from them

use serde_json::{Value, json};

use super::row::RawRow;
use crate::api::EntityId;
use crate::normalize::{extract_numeric, parse_date};

/// Waste quantity columns on the physical manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasteCategory {
    Oil,
    OilFilters,
    DieselFilters,
    Junk,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 4] = [
        WasteCategory::Oil,
        WasteCategory::OilFilters,
        WasteCategory::DieselFilters,
        WasteCategory::Junk,
    ];

    /// Backend waste type this column is recorded under
    pub fn waste_type_name(&self) -> &'static str {
        match self {
            WasteCategory::Oil => "Aceite",
            WasteCategory::OilFilters => "Filtros de Aceite",
            WasteCategory::DieselFilters => "Filtros Diesel",
            WasteCategory::Junk => "Desechos Solidos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WasteCategory::Oil => "oil",
            WasteCategory::OilFilters => "oil filters",
            WasteCategory::DieselFilters => "diesel filters",
            WasteCategory::Junk => "general",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            WasteCategory::Oil => "liters",
            WasteCategory::OilFilters | WasteCategory::DieselFilters => "units",
            WasteCategory::Junk => "kg",
        }
    }
}

/// A manifest row normalized for submission
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestPayload {
    pub vessel_name: String,
    /// ISO-8601 with UTC offset; `None` when the date cell did not parse
    pub inspection_date: Option<String>,
    pub oil_used: f64,
    pub oil_filters_used: f64,
    pub diesel_filters_used: f64,
    pub junk_reported: f64,
    pub captain_name: String,
    pub chef_name: String,
    pub observations: String,
}

impl ManifestPayload {
    pub fn from_row(row: &RawRow) -> Self {
        Self {
            vessel_name: row.vessel_name().to_string(),
            inspection_date: parse_date(row.date()).map(|date| date.to_rfc3339()),
            oil_used: extract_numeric(row.oil_used.as_deref()),
            oil_filters_used: extract_numeric(row.oil_filters_used.as_deref()),
            diesel_filters_used: extract_numeric(row.diesel_filters_used.as_deref()),
            junk_reported: extract_numeric(row.junk_reported.as_deref()),
            captain_name: row.captain_name().to_string(),
            chef_name: row.chef_name().to_string(),
            observations: observations_for(row.id()),
        }
    }

    pub fn quantity(&self, category: WasteCategory) -> f64 {
        match category {
            WasteCategory::Oil => self.oil_used,
            WasteCategory::OilFilters => self.oil_filters_used,
            WasteCategory::DieselFilters => self.diesel_filters_used,
            WasteCategory::Junk => self.junk_reported,
        }
    }

    pub fn total_waste(&self) -> f64 {
        WasteCategory::ALL.iter().map(|c| self.quantity(*c)).sum()
    }

    /// Categories with a positive quantity, in manifest column order
    pub fn reported_wastes(&self) -> impl Iterator<Item = (WasteCategory, f64)> + '_ {
        WasteCategory::ALL
            .into_iter()
            .map(|category| (category, self.quantity(category)))
            .filter(|(_, quantity)| *quantity > 0.0)
    }
}

pub fn observations_for(source_id: &str) -> String {
    format!("Digitized from physical manifest ID: {}", source_id)
}

/// Body of `POST /compliances`
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceRequest {
    pub vessel_id: EntityId,
    pub inspection_date: String,
    pub observations: String,
    pub system_user_id: EntityId,
    pub signers_ids: Vec<EntityId>,
}

impl ComplianceRequest {
    pub fn to_json(&self) -> Value {
        json!({
            "vesselId": self.vessel_id,
            "inspectionDate": self.inspection_date,
            "observations": self.observations,
            "systemUserId": self.system_user_id,
            "signersIds": self.signers_ids,
        })
    }
}

/// Body of `POST /wastes`
#[derive(Debug, Clone, PartialEq)]
pub struct WasteRequest {
    pub vessel_id: EntityId,
    pub waste_type_id: EntityId,
    pub quantity_generated: f64,
    pub generation_date: String,
    pub compliance_id: EntityId,
}

impl WasteRequest {
    pub fn to_json(&self) -> Value {
        json!({
            "vesselId": self.vessel_id,
            "wasteTypeId": self.waste_type_id,
            "quantityGenerated": self.quantity_generated,
            "generationDate": self.generation_date,
            "complianceId": self.compliance_id,
        })
    }
}

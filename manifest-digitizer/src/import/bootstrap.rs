//! One-time creation of the persons and vessels a manifest import needs
//!
//! Scans the manifest for distinct vessel, captain and chef names and
//! creates them on the backend. Every vessel is owned by a single
//! placeholder owner person, created first.

use serde_json::json;
use std::collections::HashSet;
use std::fmt;

use crate::api::{Backend, Collection, CreateFailure, CreatedRecord, EntityId};
use crate::config::BootstrapConfig;
use crate::manifest::{ManifestRecord, RawRow};

/// Distinct non-blank names, in first-seen order
///
/// Membership is exact: "John Doe" and "john doe" are different entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctNames {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl DistinctNames {
    pub fn insert(&mut self, name: &str) {
        if name.is_empty() || self.seen.contains(name) {
            return;
        }
        self.seen.insert(name.to_string());
        self.names.push(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Entity names referenced by a manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestEntities {
    pub vessels: DistinctNames,
    pub captains: DistinctNames,
    pub chefs: DistinctNames,
}

impl ManifestEntities {
    pub fn collect(records: &[ManifestRecord]) -> Self {
        let mut entities = Self::default();
        for record in records {
            match record {
                Ok(row) => entities.add(row),
                Err(e) => log::warn!("Ignoring undecodable manifest row: {}", e),
            }
        }
        entities
    }

    fn add(&mut self, row: &RawRow) {
        self.vessels.insert(row.vessel_name());
        self.captains.insert(row.captain_name());
        self.chefs.insert(row.chef_name());
    }
}

/// Creation counters for one bootstrap run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub captains: usize,
    pub chefs: usize,
    pub vessels: usize,
    pub failed: usize,
}

impl BootstrapReport {
    /// Persons created, the owner included
    pub fn total_persons(&self) -> usize {
        1 + self.captains + self.chefs
    }

    pub fn total_vessels(&self) -> usize {
        self.vessels
    }
}

impl fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1 owner, {} captains, {} chefs, {} vessels ({} failed)",
            self.captains, self.chefs, self.vessels, self.failed
        )
    }
}

/// The bootstrap cannot proceed without an owner for its vessels
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapError {
    OwnerNotCreated(CreateFailure),
    OwnerMissingId,
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::OwnerNotCreated(reason) => {
                write!(f, "Failed to create unknown owner: {}", reason)
            }
            BootstrapError::OwnerMissingId => {
                write!(f, "Unknown owner was created but no ID was returned")
            }
        }
    }
}

impl std::error::Error for BootstrapError {}

pub struct EntityBootstrapper<'a> {
    backend: &'a dyn Backend,
    config: &'a BootstrapConfig,
}

impl<'a> EntityBootstrapper<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a BootstrapConfig) -> Self {
        Self { backend, config }
    }

    /// Create the owner, then captains, chefs and vessels
    ///
    /// Only the owner creation is fatal; every other failure is logged,
    /// counted and skipped.
    pub async fn run(&self, records: &[ManifestRecord]) -> Result<BootstrapReport, BootstrapError> {
        log::info!("Processing {} records for entity creation", records.len());

        let entities = ManifestEntities::collect(records);
        log::info!("Found {} unique vessels", entities.vessels.len());
        log::info!("Found {} unique captains", entities.captains.len());
        log::info!("Found {} unique chefs", entities.chefs.len());
        if entities.vessels.is_empty() {
            log::warn!("No vessel names found; only the owner will be created");
        }

        log::info!("Creating owner '{}'", self.config.owner_name);
        let owner = self
            .create_person(
                &self.config.owner_name,
                self.config.person_types.owner,
                &self.config.owner_contact,
            )
            .await
            .map_err(BootstrapError::OwnerNotCreated)?;
        let owner_id = owner.id.ok_or(BootstrapError::OwnerMissingId)?;

        let mut report = BootstrapReport::default();

        log::info!("Creating {} captains", entities.captains.len());
        for name in entities.captains.iter() {
            let created = self
                .create_person(
                    name,
                    self.config.person_types.captain,
                    &self.config.captain_contact,
                )
                .await;
            match created {
                Ok(_) => report.captains += 1,
                Err(_) => report.failed += 1,
            }
        }

        log::info!("Creating {} chefs", entities.chefs.len());
        for name in entities.chefs.iter() {
            let created = self
                .create_person(name, self.config.person_types.chef, &self.config.chef_contact)
                .await;
            match created {
                Ok(_) => report.chefs += 1,
                Err(_) => report.failed += 1,
            }
        }

        log::info!("Creating {} vessels", entities.vessels.len());
        for name in entities.vessels.iter() {
            let created = self.create_vessel(name, &owner_id).await;
            match created {
                Ok(_) => report.vessels += 1,
                Err(_) => report.failed += 1,
            }
        }

        log::info!("Base entities created: {}", report);
        Ok(report)
    }

    async fn create_person(
        &self,
        name: &str,
        person_type_id: i64,
        contact_info: &str,
    ) -> Result<CreatedRecord, CreateFailure> {
        let body = json!({
            "name": name,
            "personTypeId": person_type_id,
            "contactInfo": contact_info,
        });

        let result = self.backend.create(Collection::Persons, body).await;
        match &result {
            Ok(person) => log::info!("✓ Created person: {} (ID: {})", name, display_id(person)),
            Err(reason) => log::error!("✗ Failed to create person: {} - {}", name, reason),
        }
        result
    }

    async fn create_vessel(
        &self,
        name: &str,
        owner_id: &EntityId,
    ) -> Result<CreatedRecord, CreateFailure> {
        let body = json!({
            "vesselName": name,
            "vesselType": self.config.vessel_type,
            "ownerId": owner_id,
        });

        let result = self.backend.create(Collection::Vessels, body).await;
        match &result {
            Ok(vessel) => log::info!("✓ Created vessel: {} (ID: {})", name, display_id(vessel)),
            Err(reason) => log::error!("✗ Failed to create vessel: {} - {}", name, reason),
        }
        result
    }
}

fn display_id(record: &CreatedRecord) -> String {
    record
        .id
        .as_ref()
        .map(EntityId::to_string)
        .unwrap_or_else(|| "?".to_string())
}

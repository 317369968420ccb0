//! Manifest import: one compliance plus its waste records per row
//!
//! Rows are processed strictly in order, each with all of its round trips
//! completed before the next starts. A compliance is always created before
//! any of its waste records, and a row fails before any POST when its
//! vessel cannot be resolved.

use anyhow::Result;
use std::fmt;

use crate::api::{Backend, Collection, CreateFailure, EntityId};
use crate::config::{Config, DateFallback, FallbackPolicy, SignerFallback};
use crate::entities::{EntityCache, EntityResolver};
use crate::manifest::{
    ComplianceRequest, ManifestPayload, ManifestRecord, RawRow, WasteCategory, WasteRequest,
};
use crate::normalize::normalize_date;

/// Run counters, reset at the start of every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} successful, {} failed, {} skipped",
            self.processed, self.successful, self.failed, self.skipped
        )
    }
}

/// Result of one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Compliance created; waste submissions are reported but do not
    /// affect the row outcome
    Submitted {
        compliance_id: EntityId,
        wastes_attempted: usize,
        wastes_created: usize,
    },
    /// No waste reported on the manifest
    Skipped,
    Failed(RowFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowFailure {
    VesselNotFound(String),
    NoSigners,
    InvalidDate(String),
    ComplianceNotCreated(CreateFailure),
    MissingComplianceId,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::VesselNotFound(name) => write!(f, "vessel '{}' not found", name),
            RowFailure::NoSigners => write!(f, "no signer could be resolved"),
            RowFailure::InvalidDate(raw) => write!(f, "could not parse date '{}'", raw),
            RowFailure::ComplianceNotCreated(reason) => {
                write!(f, "failed to create compliance: {}", reason)
            }
            RowFailure::MissingComplianceId => write!(f, "no compliance ID found in response"),
        }
    }
}

pub struct ManifestImporter<'a> {
    backend: &'a dyn Backend,
    config: &'a Config,
    stats: RunStats,
}

impl<'a> ManifestImporter<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a Config) -> Self {
        Self {
            backend,
            config,
            stats: RunStats::default(),
        }
    }

    /// Load the entity cache and import every record in `records`
    pub async fn run(&mut self, records: &[ManifestRecord]) -> RunStats {
        self.stats = RunStats::default();
        log::info!("Processing {} manifest records", records.len());

        let cache = EntityCache::load(self.backend, &self.config.page_sizes).await;
        let resolver = EntityResolver::new(cache, self.config.fallbacks.inspector_id.clone());
        if resolver.cache().vessels.is_empty() {
            log::warn!("No vessels cached; every row will fail until bootstrap has run");
        }

        let total = records.len();
        let progress_every = self.config.import.progress_every.max(1);

        for record in records {
            self.stats.processed += 1;
            let position = self.stats.processed;

            let outcome = match record {
                Ok(row) => self.import_row(&resolver, row).await,
                Err(e) => Err(anyhow::anyhow!("Could not decode manifest row: {}", e)),
            };

            match outcome {
                Ok(RowOutcome::Submitted { .. }) => {
                    self.stats.successful += 1;
                    log::info!(
                        "✓ Processed manifest {}/{} for vessel '{}'",
                        position,
                        total,
                        vessel_label(record)
                    );
                }
                Ok(RowOutcome::Skipped) => self.stats.skipped += 1,
                Ok(RowOutcome::Failed(reason)) => {
                    self.stats.failed += 1;
                    log::error!(
                        "✗ Failed to process manifest {}/{} for vessel '{}': {}",
                        position,
                        total,
                        vessel_label(record),
                        reason
                    );
                }
                Err(e) => {
                    self.stats.failed += 1;
                    log::error!("Error processing manifest {}: {:?}", position, e);
                }
            }

            if position % progress_every == 0 {
                log::info!("Progress: {}/{} - {}", position, total, self.stats);
            }
        }

        log::info!("Import complete: {}", self.stats);
        self.stats
    }

    /// Import a single decoded row
    pub async fn import_row(&self, resolver: &EntityResolver, row: &RawRow) -> Result<RowOutcome> {
        let payload = ManifestPayload::from_row(row);

        if payload.total_waste() == 0.0 {
            log::info!(
                "Skipping manifest for '{}' - no waste reported",
                payload.vessel_name
            );
            return Ok(RowOutcome::Skipped);
        }

        let Some(vessel) = resolver.resolve_vessel(&payload.vessel_name) else {
            return Ok(RowOutcome::Failed(RowFailure::VesselNotFound(
                payload.vessel_name,
            )));
        };

        let signers_ids = match signers(resolver, &payload, &self.config.fallbacks) {
            Some(ids) => ids,
            None => return Ok(RowOutcome::Failed(RowFailure::NoSigners)),
        };

        let inspection_date = match (&payload.inspection_date, self.config.fallbacks.date) {
            (Some(date), _) => date.clone(),
            (None, DateFallback::Now) => normalize_date(row.date()),
            (None, DateFallback::Fail) => {
                return Ok(RowOutcome::Failed(RowFailure::InvalidDate(
                    row.date().to_string(),
                )));
            }
        };

        let inspector = resolver.default_inspector();

        let compliance = ComplianceRequest {
            vessel_id: vessel.id.clone(),
            inspection_date: inspection_date.clone(),
            observations: payload.observations.clone(),
            system_user_id: inspector.id.clone(),
            signers_ids,
        };

        log::info!("Creating compliance for vessel '{}'...", payload.vessel_name);
        let created = match self
            .backend
            .create(Collection::Compliances, compliance.to_json())
            .await
        {
            Ok(created) => created,
            Err(reason) => {
                return Ok(RowOutcome::Failed(RowFailure::ComplianceNotCreated(reason)));
            }
        };

        let Some(compliance_id) = created.id else {
            return Ok(RowOutcome::Failed(RowFailure::MissingComplianceId));
        };
        log::info!("Created compliance ID: {}", compliance_id);
        log::debug!("Compliance record: {:?}", created.data);

        let mut wastes_attempted = 0;
        let mut wastes_created = 0;

        for (category, quantity) in payload.reported_wastes() {
            let Some(waste_type) = resolver.resolve_waste_type(category.waste_type_name()) else {
                continue;
            };
            wastes_attempted += 1;

            let waste = WasteRequest {
                vessel_id: vessel.id.clone(),
                waste_type_id: waste_type.id.clone(),
                quantity_generated: quantity,
                generation_date: inspection_date.clone(),
                compliance_id: compliance_id.clone(),
            };

            if self.submit_waste(category, &waste).await {
                wastes_created += 1;
            }
        }

        log::info!(
            "Successfully created manifest with {} waste records",
            wastes_created
        );

        Ok(RowOutcome::Submitted {
            compliance_id,
            wastes_attempted,
            wastes_created,
        })
    }

    async fn submit_waste(&self, category: WasteCategory, waste: &WasteRequest) -> bool {
        match self.backend.create(Collection::Wastes, waste.to_json()).await {
            Ok(_) => {
                log::info!(
                    "Created {} waste record: {} {}",
                    category.label(),
                    waste.quantity_generated,
                    category.unit()
                );
                true
            }
            Err(reason) => {
                log::warn!(
                    "Failed to create {} waste record for compliance {}: {}",
                    category.label(),
                    waste.compliance_id,
                    reason
                );
                false
            }
        }
    }
}

/// Signer IDs for a row: captain then chef, or the configured fallback
fn signers(
    resolver: &EntityResolver,
    payload: &ManifestPayload,
    policy: &FallbackPolicy,
) -> Option<Vec<EntityId>> {
    let ids: Vec<EntityId> = [&payload.captain_name, &payload.chef_name]
        .into_iter()
        .filter_map(|name| resolver.resolve_person(name))
        .map(|person| person.id.clone())
        .collect();

    if !ids.is_empty() {
        return Some(ids);
    }

    match policy.signer {
        SignerFallback::Fixed => {
            log::warn!(
                "No signers found for manifest, using default signer {}",
                policy.default_signer_id
            );
            Some(vec![policy.default_signer_id.clone()])
        }
        SignerFallback::Fail => None,
    }
}

fn vessel_label(record: &ManifestRecord) -> &str {
    match record {
        Ok(row) => row.vessel_name(),
        Err(_) => "<undecodable>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::client::testing::FakeBackend;
    use crate::manifest::row::fixtures::manifest;
    use crate::manifest::ManifestFile;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Backend with one vessel, a captain, the four waste types and an
    /// inspector; creates always succeed with increasing IDs
    fn populated_backend() -> FakeBackend {
        let next_id = Mutex::new(100);
        FakeBackend::new(move |method, path, _| match (method, path) {
            (Method::Get, "/vessels/0/1000") => {
                Some(json!({"data": [{"ID": 10, "VesselName": "Atlantic Star"}]}))
            }
            (Method::Get, "/persons/0/5000") => Some(json!({"data": [
                {"ID": 20, "Name": "John Doe"},
                {"id": 21, "Name": "Ana Cruz"},
            ]})),
            (Method::Get, "/wasteTypes/0/100") => Some(json!({"data": [
                {"id": 1, "typeName": "Aceite"},
                {"id": 2, "typeName": "Filtros de Aceite"},
                {"id": 3, "typeName": "Filtros Diesel"},
                {"id": 4, "typeName": "Desechos Solidos"},
            ]})),
            (Method::Get, "/systemUsers/0/100") => {
                Some(json!({"data": [{"ID": 5, "FullName": "Inspector Gadget"}]}))
            }
            (Method::Post, _) => {
                let mut id = next_id.lock().unwrap();
                *id += 1;
                Some(json!({"success": true, "data": {"id": *id}}))
            }
            _ => None,
        })
    }

    fn empty_backend() -> FakeBackend {
        FakeBackend::new(|method, _, _| match method {
            Method::Get => Some(json!({"data": []})),
            Method::Post => Some(json!({"success": true, "data": {"id": 1}})),
        })
    }

    async fn run(backend: &FakeBackend, config: &Config, file: &ManifestFile) -> RunStats {
        let mut importer = ManifestImporter::new(backend, config);
        importer.run(file.slice(0, None)).await
    }

    #[tokio::test]
    async fn test_end_to_end_single_oil_record() {
        let backend = populated_backend();
        let config = Config::default();
        let file = manifest(&["7,Atlantic Star,2024/01/10,50 litros,0,0,0,John Doe,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(
            stats,
            RunStats {
                processed: 1,
                successful: 1,
                failed: 0,
                skipped: 0
            }
        );

        let compliances = backend.posts_to("/compliances");
        assert_eq!(compliances.len(), 1);
        assert_eq!(
            compliances[0],
            json!({
                "vesselId": 10,
                "inspectionDate": "2024-01-10T00:00:00+00:00",
                "observations": "Digitized from physical manifest ID: 7",
                "systemUserId": 5,
                "signersIds": [20],
            })
        );

        let wastes = backend.posts_to("/wastes");
        assert_eq!(wastes.len(), 1);
        assert_eq!(wastes[0]["wasteTypeId"], json!(1));
        assert_eq!(wastes[0]["quantityGenerated"], json!(50.0));
        assert_eq!(wastes[0]["complianceId"], json!(101));
        assert_eq!(wastes[0]["generationDate"], json!("2024-01-10T00:00:00+00:00"));

        // The compliance is created before its waste records
        let post_paths: Vec<String> = backend
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .map(|r| r.path)
            .collect();
        assert_eq!(post_paths, vec!["/compliances", "/wastes"]);
    }

    #[tokio::test]
    async fn test_zero_waste_row_is_skipped_without_requests() {
        let backend = populated_backend();
        let config = Config::default();
        let file = manifest(&["8,Atlantic Star,2024/01/10,0,n/a,,0 kg,John Doe,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.successful + stats.failed, 0);
        assert_eq!(backend.post_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_vessel_fails_before_any_post() {
        let backend = empty_backend();
        let config = Config::default();
        let file = manifest(&[
            "1,Atlantic Star,2024/01/10,50,1,1,1,John Doe,Ana Cruz",
            "2,Sea Wolf,2024/01/11,5,0,0,0,,",
        ]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.failed, 2);
        assert_eq!(stats.successful, 0);
        assert_eq!(backend.post_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_signers_use_fallback() {
        let backend = populated_backend();
        let config = Config::default();
        let file = manifest(&["9,Atlantic Star,2024/01/10,1,0,0,0,Nobody Known,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.successful, 1);
        let compliances = backend.posts_to("/compliances");
        assert_eq!(compliances[0]["signersIds"], json!([1]));
    }

    #[tokio::test]
    async fn test_missing_signers_fail_when_configured() {
        let backend = populated_backend();
        let mut config = Config::default();
        config.fallbacks.signer = SignerFallback::Fail;
        let file = manifest(&["9,Atlantic Star,2024/01/10,1,0,0,0,,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(backend.post_count(), 0);
    }

    #[tokio::test]
    async fn test_captain_and_chef_are_both_signers() {
        let backend = populated_backend();
        let config = Config::default();
        let file = manifest(&["3,atlantic star,2024-02-01,0,0,0,12 kg,JOHN DOE, ana cruz "]);

        run(&backend, &config, &file).await;

        let compliances = backend.posts_to("/compliances");
        assert_eq!(compliances[0]["signersIds"], json!([20, 21]));
        let wastes = backend.posts_to("/wastes");
        assert_eq!(wastes.len(), 1);
        assert_eq!(wastes[0]["wasteTypeId"], json!(4));
    }

    #[tokio::test]
    async fn test_unparseable_date_policy() {
        let file = manifest(&["4,Atlantic Star,someday,1,0,0,0,John Doe,"]);

        let backend = populated_backend();
        let config = Config::default();
        let before = chrono::Utc::now().timestamp();
        let stats = run(&backend, &config, &file).await;
        assert_eq!(stats.successful, 1);
        let date = backend.posts_to("/compliances")[0]["inspectionDate"]
            .as_str()
            .unwrap()
            .to_string();
        let stamped = chrono::DateTime::parse_from_rfc3339(&date).unwrap().timestamp();
        assert!(stamped >= before - 1);

        let backend = populated_backend();
        let mut config = Config::default();
        config.fallbacks.date = DateFallback::Fail;
        let stats = run(&backend, &config, &file).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(backend.post_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_compliance_attempts_no_wastes() {
        let backend = FakeBackend::new(|method, path, _| match (method, path) {
            (Method::Get, "/vessels/0/1000") => {
                Some(json!({"data": [{"ID": 10, "VesselName": "Atlantic Star"}]}))
            }
            (Method::Get, "/wasteTypes/0/100") => {
                Some(json!({"data": [{"id": 1, "typeName": "Aceite"}]}))
            }
            (Method::Get, _) => Some(json!({"data": []})),
            (Method::Post, "/compliances") => Some(json!({"success": false, "message": "invalid"})),
            (Method::Post, _) => Some(json!({"success": true, "data": {"id": 1}})),
        });
        let config = Config::default();
        let file = manifest(&["5,Atlantic Star,2024/01/10,10,0,0,0,,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(backend.posts_to("/compliances").len(), 1);
        assert!(backend.posts_to("/wastes").is_empty());
    }

    #[tokio::test]
    async fn test_compliance_without_id_fails() {
        let backend = FakeBackend::new(|method, path, _| match (method, path) {
            (Method::Get, "/vessels/0/1000") => {
                Some(json!({"data": [{"ID": 10, "VesselName": "Atlantic Star"}]}))
            }
            (Method::Get, _) => Some(json!({"data": []})),
            (Method::Post, _) => Some(json!({"success": true, "data": {"vesselId": 10}})),
        });
        let config = Config::default();
        let file = manifest(&["5,Atlantic Star,2024/01/10,10,0,0,0,,"]);

        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.failed, 1);
        assert!(backend.posts_to("/wastes").is_empty());
    }

    #[tokio::test]
    async fn test_waste_failures_do_not_fail_the_row() {
        let backend = FakeBackend::new(|method, path, body: Option<&Value>| {
            match (method, path) {
                (Method::Get, "/vessels/0/1000") => {
                    Some(json!({"data": [{"ID": 10, "VesselName": "Atlantic Star"}]}))
                }
                (Method::Get, "/wasteTypes/0/100") => Some(json!({"data": [
                    {"id": 1, "typeName": "Aceite"},
                    {"id": 2, "typeName": "Filtros de Aceite"},
                    {"id": 3, "typeName": "Filtros Diesel"},
                ]})),
                (Method::Get, _) => Some(json!({"data": []})),
                (Method::Post, "/compliances") => {
                    Some(json!({"success": true, "data": {"ID": 55}}))
                }
                (Method::Post, "/wastes") => {
                    // Oil filters are rejected, everything else succeeds
                    let waste_type = body.and_then(|b| b.get("wasteTypeId")).cloned();
                    if waste_type == Some(json!(2)) {
                        None
                    } else {
                        Some(json!({"success": true, "data": {"id": 900}}))
                    }
                }
                _ => None,
            }
        });
        let config = Config::default();
        let file = manifest(&["6,Atlantic Star,2024/01/10,10,2,1,3,,"]);

        let mut importer = ManifestImporter::new(&backend, &config);
        let stats = importer.run(file.slice(0, None)).await;

        assert_eq!(stats.successful, 1);
        // Junk has no cached waste type, so only three submissions happen
        let wastes = backend.posts_to("/wastes");
        assert_eq!(wastes.len(), 3);
        assert!(wastes.iter().all(|w| w["complianceId"] == json!(55)));
    }

    #[tokio::test]
    async fn test_row_outcome_reports_waste_counts() {
        let backend = populated_backend();
        let config = Config::default();
        let importer = ManifestImporter::new(&backend, &config);
        let cache = EntityCache::load(&backend, &config.page_sizes).await;
        let resolver = EntityResolver::new(cache, EntityId::Int(1));

        let file = manifest(&["6,Atlantic Star,2024/01/10,10,2,0,3,John Doe,"]);
        let row = file.slice(0, None)[0].as_ref().unwrap();

        let outcome = importer.import_row(&resolver, row).await.unwrap();
        assert_eq!(
            outcome,
            RowOutcome::Submitted {
                compliance_id: EntityId::Int(101),
                wastes_attempted: 3,
                wastes_created: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_row_counts_as_failed() {
        let mut content = crate::manifest::row::fixtures::HEADER.as_bytes().to_vec();
        content.extend_from_slice(b"\n1,Mar\xffin,2024/01/10,1,0,0,0,,\n2,Atlantic Star,2024/01/10,1,0,0,0,John Doe,\n");
        let file = ManifestFile::from_reader(content.as_slice()).unwrap();

        let backend = populated_backend();
        let config = Config::default();
        let stats = run(&backend, &config, &file).await;

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.successful, 1);
    }

    #[tokio::test]
    async fn test_stats_reset_between_runs() {
        let backend = populated_backend();
        let config = Config::default();
        let file = manifest(&["7,Atlantic Star,2024/01/10,50,0,0,0,John Doe,"]);

        let mut importer = ManifestImporter::new(&backend, &config);
        importer.run(file.slice(0, None)).await;
        let second = importer.run(file.slice(0, None)).await;

        assert_eq!(second.processed, 1);
        assert_eq!(second.successful, 1);
    }
}

//! Manifest import and the entity bootstrap that precedes it

pub mod bootstrap;
pub mod importer;

pub use bootstrap::{BootstrapReport, EntityBootstrapper};
pub use importer::{ManifestImporter, RunStats};

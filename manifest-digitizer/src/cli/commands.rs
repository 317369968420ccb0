//! Mode handlers: bootstrap, import, or both

use anyhow::{Context, Result, bail};
use colored::*;
use is_terminal::IsTerminal;

use super::prompt::{self, limit};
use super::{Cli, Mode};
use crate::api::BackendClient;
use crate::config::Config;
use crate::import::{BootstrapReport, EntityBootstrapper, ManifestImporter, RunStats};
use crate::manifest::ManifestFile;

/// Bounds for one run, resolved from flags or prompts
struct Bounds {
    interactive: bool,
    start: Option<usize>,
    max: Option<usize>,
}

impl Bounds {
    fn entity_limit(&self, prompt_text: &str) -> Result<Option<usize>> {
        let max = if self.interactive {
            prompt::record_count(prompt_text, None)?
        } else {
            self.max
        };
        Ok(limit(max))
    }

    fn manifest_limit(&self, prompt_text: &str, default: usize) -> Result<Option<usize>> {
        let max = if self.interactive {
            prompt::record_count(prompt_text, Some(default))?
        } else {
            self.max.or(Some(default))
        };
        Ok(limit(max))
    }

    fn start(&self) -> Result<usize> {
        if self.interactive {
            Ok(prompt::record_count("Start from record (default 0)", Some(0))?.unwrap_or(0))
        } else {
            Ok(self.start.unwrap_or(0))
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(input) = &args.input {
        config.input = input.clone();
    }

    println!("{}", "Manifest Digitization - Batch Processing".bold());
    println!("{}", "=".repeat(50));

    let mode = match args.mode {
        Some(mode) => mode,
        None => {
            if !std::io::stdin().is_terminal() {
                bail!("No --mode given and stdin is not a terminal; pass --mode bootstrap|import|full");
            }
            prompt::select_mode()?
        }
    };

    let bounds = Bounds {
        interactive: args.mode.is_none(),
        start: args.start,
        max: args.max,
    };

    let client = BackendClient::new(&config.base_url, config.request_timeout())?;
    log::info!("Using backend at {}", client.base_url());

    let manifest = ManifestFile::open(&config.input)?;
    if manifest.is_empty() {
        log::warn!("{} holds no importable records", config.input.display());
    }

    match mode {
        Mode::Bootstrap => handle_bootstrap(&client, &config, &manifest, &bounds).await,
        Mode::Import => handle_import(&client, &config, &manifest, &bounds).await,
        Mode::Full => handle_full(&client, &config, &manifest, &bounds).await,
    }
}

async fn handle_bootstrap(
    client: &BackendClient,
    config: &Config,
    manifest: &ManifestFile,
    bounds: &Bounds,
) -> Result<()> {
    println!();
    println!("Creating all unique vessels, captains, chefs and owners from the data");

    let max = bounds.entity_limit("Max records to process (press Enter for all)")?;
    let report = bootstrap(client, config, manifest, max).await?;

    println!();
    println!("{}", "Base entities created successfully!".green().bold());
    print_bootstrap_report(&report);
    println!();
    println!("You can now run the import mode to process compliance manifests.");
    Ok(())
}

async fn handle_import(
    client: &BackendClient,
    config: &Config,
    manifest: &ManifestFile,
    bounds: &Bounds,
) -> Result<()> {
    println!();
    println!("Creating compliance records and waste entries");

    let start = bounds.start()?;
    let max = bounds.manifest_limit(
        &format!(
            "Max records to process (default {})",
            config.import.default_max_records
        ),
        config.import.default_max_records,
    )?;

    let stats = import(client, config, manifest, start, max).await;

    println!();
    println!("{}", "COMPLIANCE MANIFESTS COMPLETE".bold());
    println!("{}", "=".repeat(50));
    print_run_stats(&stats);
    if stats.successful > 0 {
        println!();
        println!("{}", "Manifests digitized successfully!".green().bold());
    }
    Ok(())
}

async fn handle_full(
    client: &BackendClient,
    config: &Config,
    manifest: &ManifestFile,
    bounds: &Bounds,
) -> Result<()> {
    println!();
    println!("Starting full process...");

    let entity_max = bounds.entity_limit("Max records for entities (press Enter for all)")?;
    let report = bootstrap(client, config, manifest, entity_max).await?;
    println!(
        "{} {} persons, {} vessels",
        "Base entities complete:".green(),
        report.total_persons(),
        report.total_vessels()
    );

    let manifest_max = bounds.manifest_limit(
        &format!(
            "Max manifest records to process (default {})",
            config.import.default_max_records
        ),
        config.import.default_max_records,
    )?;
    let stats = import(client, config, manifest, 0, manifest_max).await;

    println!();
    println!("{}", "FULL PROCESS COMPLETE".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Entities: {} persons, {} vessels",
        report.total_persons(),
        report.total_vessels()
    );
    println!(
        "Manifests: {} successful, {} failed, {} skipped",
        stats.successful.to_string().green(),
        stats.failed.to_string().red(),
        stats.skipped.to_string().yellow()
    );
    Ok(())
}

async fn bootstrap(
    client: &BackendClient,
    config: &Config,
    manifest: &ManifestFile,
    max: Option<usize>,
) -> Result<BootstrapReport> {
    let records = manifest.slice(0, max);
    let bootstrapper = EntityBootstrapper::new(client, &config.bootstrap);

    match bootstrapper.run(records).await {
        Ok(report) => Ok(report),
        Err(e) => {
            log::error!("{} - aborting", e);
            Err(e).context("Entity bootstrap aborted")
        }
    }
}

async fn import(
    client: &BackendClient,
    config: &Config,
    manifest: &ManifestFile,
    start: usize,
    max: Option<usize>,
) -> RunStats {
    let records = manifest.slice(start, max);
    log::info!(
        "Processing {} of {} records (starting from index {})",
        records.len(),
        manifest.len(),
        start
    );

    let mut importer = ManifestImporter::new(client, config);
    importer.run(records).await
}

fn print_bootstrap_report(report: &BootstrapReport) {
    println!("   - Persons: {}", report.total_persons());
    println!("   - Vessels: {}", report.total_vessels());
    if report.failed > 0 {
        println!(
            "   - {} {}",
            report.failed.to_string().red(),
            "creations failed (see log)".red()
        );
    }
}

fn print_run_stats(stats: &RunStats) {
    println!("Total processed: {}", stats.processed);
    println!("Successful: {}", stats.successful.to_string().green());
    println!("Failed: {}", stats.failed.to_string().red());
    println!("Skipped: {}", stats.skipped.to_string().yellow());
}

//! Raw manifest rows read from the CSV export
//!
//! Columns are matched by header name. Fully blank rows and test vessels
//! are dropped at load time, before any counting or slicing.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header names every manifest export must carry
pub const COLUMNS: [&str; 9] = [
    "ID",
    "Vessel Name",
    "Date",
    "Oil Used",
    "Oil Filters Used",
    "Diesel Filters Used",
    "Junk Reported",
    "Captain Full Name",
    "Chef Full Name",
];

/// One physical manifest, exactly as typed into the spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "ID")]
    pub id: Option<String>,
    #[serde(rename = "Vessel Name")]
    pub vessel_name: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Oil Used")]
    pub oil_used: Option<String>,
    #[serde(rename = "Oil Filters Used")]
    pub oil_filters_used: Option<String>,
    #[serde(rename = "Diesel Filters Used")]
    pub diesel_filters_used: Option<String>,
    #[serde(rename = "Junk Reported")]
    pub junk_reported: Option<String>,
    #[serde(rename = "Captain Full Name")]
    pub captain_name: Option<String>,
    #[serde(rename = "Chef Full Name")]
    pub chef_name: Option<String>,
}

fn cell(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

impl RawRow {
    pub fn id(&self) -> &str {
        cell(&self.id)
    }

    pub fn vessel_name(&self) -> &str {
        cell(&self.vessel_name)
    }

    pub fn date(&self) -> &str {
        cell(&self.date)
    }

    pub fn captain_name(&self) -> &str {
        cell(&self.captain_name)
    }

    pub fn chef_name(&self) -> &str {
        cell(&self.chef_name)
    }

    fn cells(&self) -> [&Option<String>; 9] {
        [
            &self.id,
            &self.vessel_name,
            &self.date,
            &self.oil_used,
            &self.oil_filters_used,
            &self.diesel_filters_used,
            &self.junk_reported,
            &self.captain_name,
            &self.chef_name,
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.cells().iter().all(|value| cell(value).is_empty())
    }

    /// Test manifests were entered while the spreadsheet was being set up
    pub fn is_test(&self) -> bool {
        self.vessel_name().to_lowercase().contains("test")
    }
}

/// A decoded row, or the reason it could not be decoded
pub type ManifestRecord = Result<RawRow, csv::Error>;

/// Filtered contents of a manifest export
#[derive(Debug)]
pub struct ManifestFile {
    records: Vec<ManifestRecord>,
    /// Rows read before filtering
    pub total_rows: usize,
    pub dropped_blank: usize,
    pub dropped_test: usize,
}

impl ManifestFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open manifest file: {}", path.display()))?;
        let manifest = Self::from_reader(file)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;

        log::info!(
            "Loaded {} manifest records from {} ({} blank, {} test rows dropped)",
            manifest.total_rows,
            path.display(),
            manifest.dropped_blank,
            manifest.dropped_test
        );
        Ok(manifest)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: csv::StringRecord = reader
            .headers()
            .context("Failed to read header row")?
            .iter()
            .map(str::trim)
            .collect();
        let missing: Vec<&str> = COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            bail!("Missing column(s): {}", missing.join(", "));
        }

        let mut manifest = ManifestFile {
            records: Vec::new(),
            total_rows: 0,
            dropped_blank: 0,
            dropped_test: 0,
        };

        for record in reader.records() {
            manifest.total_rows += 1;
            let decoded = record.and_then(|mut record| {
                // Short rows: spreadsheet exports drop trailing empty cells
                while record.len() < headers.len() {
                    record.push_field("");
                }
                record.deserialize::<RawRow>(Some(&headers))
            });

            match decoded {
                Ok(row) if row.is_blank() => manifest.dropped_blank += 1,
                Ok(row) if row.is_test() => manifest.dropped_test += 1,
                other => manifest.records.push(other),
            }
        }

        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Skip `start` records, then take at most `max`
    pub fn slice(&self, start: usize, max: Option<usize>) -> &[ManifestRecord] {
        let start = start.min(self.records.len());
        let end = match max {
            Some(max) => start.saturating_add(max).min(self.records.len()),
            None => self.records.len(),
        };
        &self.records[start..end]
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::workflows::estimation::{DealEstimate, PropertyInsight, SubjectProperty};

pub const EXPORT_HEADER: [&str; 7] = [
    "property_address",
    "city",
    "state",
    "postal_code",
    "mao",
    "arv",
    "created_at",
];

/// One saved deal in the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub property: SubjectProperty,
    pub insight: PropertyInsight,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub crm_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pipeline journal {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),
}

/// JSON-list journal of saved deals at a fixed path.
#[derive(Debug, Clone)]
pub struct PipelineStore {
    path: PathBuf,
}

impl PipelineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved records in insertion order; empty when the journal does not exist yet.
    pub fn records(&self) -> Result<Vec<PipelineRecord>, PipelineError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&raw).map_err(|source| PipelineError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(
        &self,
        estimate: &DealEstimate,
        tags: &[String],
        crm_url: Option<&str>,
        created_at: NaiveDate,
    ) -> Result<PipelineRecord, PipelineError> {
        let record = PipelineRecord {
            property: estimate.property.clone(),
            insight: estimate.insight.clone(),
            created_at,
            tags: tags.to_vec(),
            crm_url: crm_url.map(str::to_string),
        };

        let mut records = self.records()?;
        records.push(record.clone());

        ensure_parent(&self.path)?;
        let body = serde_json::to_string_pretty(&records).map_err(|source| PipelineError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(|source| self.io_error(source))?;

        info!(
            path = %self.path.display(),
            address = %record.property.address,
            total = records.len(),
            "deal saved to pipeline"
        );
        Ok(record)
    }

    /// Writes every record as one CSV row under [`EXPORT_HEADER`].
    pub fn export_csv(&self, destination: &Path) -> Result<PathBuf, PipelineError> {
        let records = self.records()?;
        ensure_parent(destination)?;

        let mut writer = csv::Writer::from_path(destination)?;
        writer.write_record(EXPORT_HEADER)?;
        for record in &records {
            writer.write_record([
                record.property.address.clone(),
                record.property.city.clone(),
                record.property.state.clone(),
                record.property.postal_code.clone(),
                record.insight.mao.to_string(),
                record.insight.arv.to_string(),
                record.created_at.to_string(),
            ])?;
        }
        writer.flush().map_err(|source| PipelineError::Io {
            path: destination.to_path_buf(),
            source,
        })?;

        info!(
            destination = %destination.display(),
            rows = records.len(),
            "pipeline exported"
        );
        Ok(destination.to_path_buf())
    }

    fn io_error(&self, source: io::Error) -> PipelineError {
        PipelineError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

//! File-backed document store.
//!
//! The whole system state lives in one XML file. Every read parses the
//! complete document and every write serializes it back in full. The store
//! does no locking of its own; callers that share it must serialize access.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::api::{ConsumptionSummary, LoadSummary, NewResource};
use crate::document::{self, parse_decimal};
use crate::errors::StoreError;
use crate::model::{Catalog, ConsumptionRecord, Resource};

#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Catalog, StoreError> {
        let xml = match fs::read_to_string(&self.path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotInitialized(self.path.clone()))
            }
            Err(e) => return Err(self.io_error(e)),
        };
        document::parse_catalog(&xml).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let xml = document::render_catalog(catalog)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, xml).map_err(|e| self.io_error(e))
    }

    /// Write the empty base structure if no data file exists yet.
    /// Returns `true` when the file was created.
    pub fn ensure_initialized(&self) -> Result<bool, StoreError> {
        if self.exists() {
            return Ok(false);
        }
        info!(path = %self.path.display(), "data file not found, creating empty document");
        self.save(&Catalog::empty())?;
        Ok(true)
    }

    /// Replace the whole document with an uploaded configuration.
    ///
    /// The upload is parsed before anything is written, so a malformed file
    /// leaves the previous state untouched.
    pub fn replace_with_config(&self, xml: &str) -> Result<LoadSummary, StoreError> {
        let catalog = document::parse_catalog(xml)?;
        self.save(&catalog)?;

        let summary = LoadSummary {
            resources: catalog.resources.len(),
            categories: catalog.categories.len(),
            clients: catalog.clients.len(),
            instances: catalog.instance_count(),
        };
        info!(
            resources = summary.resources,
            categories = summary.categories,
            clients = summary.clients,
            instances = summary.instances,
            "configuration stored"
        );
        Ok(summary)
    }

    /// Append a batch of consumption records to their instances.
    ///
    /// Entries whose client or instance cannot be found, or whose hours or
    /// timestamp are missing, are skipped and reported. The document is
    /// written once, after the whole batch.
    pub fn record_consumptions(&self, xml: &str) -> Result<ConsumptionSummary, StoreError> {
        let mut catalog = self.load()?;
        let entries = document::parse_consumption_batch(xml)?;
        let mut summary = ConsumptionSummary::default();

        for entry in entries {
            let Some(client) = catalog.find_client_mut(&entry.nit) else {
                summary.errors.push(format!(
                    "client with NIT '{}' not found, consumption skipped",
                    entry.nit
                ));
                continue;
            };
            let Some(instance) = client.find_instance_mut(&entry.instance_id) else {
                summary.errors.push(format!(
                    "instance '{}' for client NIT '{}' not found, consumption skipped",
                    entry.instance_id, entry.nit
                ));
                continue;
            };
            let Some(hours) = entry.hours.as_deref().and_then(parse_decimal) else {
                summary.errors.push(format!(
                    "consumption for instance '{}' of client NIT '{}' has no valid <tiempo>, skipped",
                    entry.instance_id, entry.nit
                ));
                continue;
            };
            let Some(recorded_at) = entry
                .recorded_at
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
            else {
                summary.errors.push(format!(
                    "consumption for instance '{}' of client NIT '{}' has no <fechaHora>, skipped",
                    entry.instance_id, entry.nit
                ));
                continue;
            };

            debug!(nit = %entry.nit, instance = %entry.instance_id, hours, "consumption recorded");
            instance.consumptions.push(ConsumptionRecord { hours, recorded_at });
            summary.processed += 1;
        }

        self.save(&catalog)?;

        if !summary.errors.is_empty() {
            warn!(skipped = summary.errors.len(), "some consumption entries were skipped");
        }
        info!(processed = summary.processed, "consumption batch stored");
        Ok(summary)
    }

    /// Append a resource, creating the data file if needed. The new resource
    /// gets the next free numeric id.
    pub fn add_resource(&self, new: NewResource) -> Result<Resource, StoreError> {
        self.ensure_initialized()?;
        let mut catalog = self.load()?;
        let id = catalog
            .next_resource_id()
            .ok_or(StoreError::ResourceIdsExhausted)?;

        let resource = Resource {
            id: id.to_string(),
            name: new.name,
            abbreviation: new.abbreviation,
            metric: new.metric,
            kind: new.kind,
            rate_per_hour: new.rate_per_hour,
        };
        catalog.resources.push(resource.clone());
        self.save(&catalog)?;

        info!(id = %resource.id, name = %resource.name, "resource added");
        Ok(resource)
    }

    /// Delete the data file. Returns `true` if a file was removed.
    pub fn reset(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "data file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

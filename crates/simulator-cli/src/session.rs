//! The last billing run, kept on disk between invocations so that
//! `invoice-pdf` can find an invoice and its consumption lines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common::api::{InvoiceDetailRequest, InvoiceResponse};
use common::billing::{ConsumptionDetail, Invoice};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no billing run in session, run `cloudsim invoice` first")]
    Empty,

    #[error("invoice {0} is not part of the last billing run")]
    UnknownInvoice(u32),

    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start_date: String,
    pub end_date: String,
    pub invoices: Vec<Invoice>,
    pub details: Vec<ConsumptionDetail>,
}

impl Session {
    pub fn from_run(start_date: &str, end_date: &str, run: &InvoiceResponse) -> Self {
        Self {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            invoices: run.invoices.clone(),
            details: run.consumption_details.clone(),
        }
    }

    /// The invoice with `number` and only the lines billed to its client.
    pub fn detail_request(&self, number: u32) -> Result<InvoiceDetailRequest, SessionError> {
        let invoice = self
            .invoices
            .iter()
            .find(|invoice| invoice.invoice_number == number)
            .ok_or(SessionError::UnknownInvoice(number))?;
        let details = self
            .details
            .iter()
            .filter(|detail| detail.client_nit == invoice.client_nit)
            .cloned()
            .collect();
        Ok(InvoiceDetailRequest {
            invoice: invoice.clone(),
            details,
        })
    }
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache dir>/cloudsim/session.json`, or the temp dir when the platform
    /// has no cache dir.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cloudsim")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Session, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SessionError::Empty),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let io_error = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_error)
    }

    /// Returns `true` if a session was removed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

//! Rate table acquisition: an ordered chain of sources tried until one
//! yields a non-empty table, with the built-in table as the usual terminal.

pub mod builtin;
mod parser;
mod sources;
mod store;

pub use parser::{parse_csv, parse_json};
pub use sources::{BuiltinSource, FileSource, HttpSource};
pub use store::{refresh_in_background, spawn_auto_refresh, RateTableStore};

use crate::config::RateTableConfig;
use crate::pricing::RateTable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("failed to read rate table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rate table CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid rate table JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rate table request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate table request returned HTTP {0}")]
    Status(u16),
    #[error("unsupported rate table content type '{0}'")]
    UnsupportedContent(String),
    #[error("rate table from {0} contains no roles")]
    Empty(String),
    #[error("no rate table source succeeded ({attempts} attempted)")]
    Exhausted { attempts: usize },
    #[error("rate table refresh was interrupted: {0}")]
    Interrupted(String),
}

/// One strategy for obtaining the rate table.
pub trait RateTableSource: Debug + Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> Result<RateTable, AcquisitionError>;
}

/// A rate table together with where and when it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedTable {
    pub table: RateTable,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedTable {
    pub fn new(table: RateTable, source: impl Into<String>) -> Self {
        Self {
            table,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AcquisitionChain {
    sources: Vec<Box<dyn RateTableSource>>,
}

impl AcquisitionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote URL first, then the local file, then the built-in table.
    pub fn from_config(config: &RateTableConfig) -> Self {
        let mut chain = Self::new();
        if let Some(url) = &config.url {
            chain.push(HttpSource::new(url.clone()));
        }
        if let Some(path) = &config.path {
            chain.push(FileSource::new(path.clone()));
        }
        chain.push(BuiltinSource);
        chain
    }

    pub fn with_source(mut self, source: impl RateTableSource + 'static) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: impl RateTableSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Try each source in order, returning the first non-empty table.
    pub fn load(&self) -> Result<LoadedTable, AcquisitionError> {
        for source in &self.sources {
            let name = source.name();
            match source.load() {
                Ok(table) if !table.is_empty() => {
                    info!(source = name, roles = table.len(), "rate table loaded");
                    return Ok(LoadedTable::new(table, name));
                }
                Ok(_) => {
                    let error = AcquisitionError::Empty(name.to_string());
                    warn!(source = name, %error, "rate table source skipped");
                }
                Err(error) => {
                    warn!(source = name, %error, "rate table source failed");
                }
            }
        }

        Err(AcquisitionError::Exhausted {
            attempts: self.sources.len(),
        })
    }
}

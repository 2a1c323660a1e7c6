//! Application state management

use std::sync::Arc;

use polars::prelude::DataFrame;
use tokio::sync::RwLock;

use crate::data;
use crate::error::{DiabevalError, Result};
use crate::preprocessing::{PreparedDataset, Preprocessor};
use crate::store::ModelStore;
use crate::training::EvalEngine;

use super::ServerConfig;

/// Application state shared across handlers.
///
/// The raw table and the prepared dataset live behind separate locks;
/// preparation happens once and later requests reuse the cached transform.
pub struct AppState {
    pub config: ServerConfig,
    pub dataset: RwLock<Option<DataFrame>>,
    pub prepared: RwLock<Option<Arc<PreparedDataset>>>,
    pub store: ModelStore,
    pub engine: EvalEngine,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store = ModelStore::new(&config.models_dir)?;
        Ok(Self {
            config,
            dataset: RwLock::new(None),
            prepared: RwLock::new(None),
            store,
            engine: EvalEngine::new(),
        })
    }

    /// Read the configured CSV into memory, invalidating any previously
    /// prepared dataset.
    pub async fn load_dataset(&self) -> Result<usize> {
        let df = data::load_csv(&self.config.data_path)?;
        let rows = df.height();
        *self.dataset.write().await = Some(df);
        *self.prepared.write().await = None;
        Ok(rows)
    }

    pub async fn dataset_loaded(&self) -> bool {
        self.dataset.read().await.is_some()
    }

    /// The imputed, standardized dataset with its fitted scaler.
    ///
    /// The first caller runs the preprocessing pipeline; everyone after
    /// that shares the cached result, so the scaler is fit exactly once
    /// per loaded table.
    pub async fn prepared_dataset(&self) -> Result<Arc<PreparedDataset>> {
        if let Some(prepared) = self.prepared.read().await.as_ref() {
            return Ok(Arc::clone(prepared));
        }

        let mut slot = self.prepared.write().await;
        // Another writer may have prepared while we waited for the lock.
        if let Some(prepared) = slot.as_ref() {
            return Ok(Arc::clone(prepared));
        }

        let dataset = self.dataset.read().await;
        let df = dataset.as_ref().ok_or(DiabevalError::DataUnavailable)?;
        let prepared = Arc::new(Preprocessor::new().fit_transform(df)?);
        *slot = Some(Arc::clone(&prepared));
        Ok(prepared)
    }
}

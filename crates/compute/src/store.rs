//! Tuned-model cache keyed by prediction target and configuration hash.
//!
//! The store is passed explicitly to the ensemble runner; nothing survives
//! between calls unless it was written here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use spirit_core::PredictionTarget;

use crate::models::{HyperParams, ModelKind};
use crate::types::PredictionConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub target: PredictionTarget,
    pub config_hash: String,
}

impl StoreKey {
    pub fn for_config(config: &PredictionConfig) -> Self {
        Self {
            target: config.target,
            config_hash: config.config_hash(),
        }
    }
}

/// Hyperparameters chosen for one model under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredModel {
    pub params: HyperParams,
    /// Cross-validated RMSE of the chosen parameters.
    pub cv_rmse: f64,
    pub tuned_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ModelStore {
    entries: RwLock<HashMap<StoreKey, HashMap<ModelKind, StoredModel>>>,
}

/// Thread-safe handle shared by the facade and the runner.
pub type SharedModelStore = Arc<ModelStore>;

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedModelStore {
        Arc::new(Self::new())
    }

    pub fn get(&self, key: &StoreKey, kind: ModelKind) -> Option<StoredModel> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).and_then(|m| m.get(&kind)).cloned()
    }

    pub fn put(&self, key: StoreKey, kind: ModelKind, model: StoredModel) {
        debug!(
            target_name = %key.target,
            model = %kind,
            params = %model.params,
            cv_rmse = model.cv_rmse,
            "storing tuned model"
        );
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key).or_default().insert(kind, model);
    }

    /// Number of stored (configuration, model) pairs.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything stored for `target`.
    pub fn invalidate(&self, target: PredictionTarget) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before: usize = entries.values().map(|m| m.len()).sum();
        entries.retain(|k, _| k.target != target);
        let after: usize = entries.values().map(|m| m.len()).sum();
        before - after
    }
}

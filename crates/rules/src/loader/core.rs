//! Core [`RuleLoader`] struct: filesystem-backed rule loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::alert_policy::CompiledAlertPolicy;
use crate::forecast_profile::CompiledForecastProfile;
use crate::schema::{RuleDocument, RuleEnvelope};
use crate::sentiment_lexicon::CompiledLexicon;

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::extends::resolve_one;

type DocumentMap = HashMap<String, RuleDocument>;

/// Filesystem-backed rule loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, resolves
/// `extends` inheritance, deserializes them into [`RuleDocument`] instances
/// via two-pass deserialization, and keeps an in-memory map keyed by rule ID.
pub struct RuleLoader {
    rules_dir: PathBuf,
    documents: Arc<RwLock<DocumentMap>>,
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse, inheritance and
    /// validation errors are reported per file and do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        let mut candidates = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results, &mut candidates)?;

        // First pass: raw YAML values keyed by rule id, for extends resolution.
        let mut raw_values: HashMap<String, serde_yaml::Value> = HashMap::new();
        let mut paths: Vec<(String, PathBuf)> = Vec::new();
        for path in candidates {
            match read_raw(&path) {
                Ok((id, value)) => {
                    if raw_values.contains_key(&id) {
                        warn!(rule_id = %id, path = %path.display(), "duplicate rule id");
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Failed {
                                error: format!("duplicate rule id '{}'", id),
                            },
                        });
                        continue;
                    }
                    raw_values.insert(id.clone(), value);
                    paths.push((id, path));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        // Second pass: resolve inheritance and parse into typed documents.
        for (id, path) in paths {
            let parsed = resolve_one(&id, &raw_values)
                .map_err(RuleError::Validation)
                .and_then(parse_value);
            match parsed {
                Ok(doc) => {
                    info!(rule_id = %id, kind = %doc.kind(), path = %path.display(), "loaded rule");
                    self.write_lock().insert(id.clone(), doc);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id: id },
                    });
                }
                Err(e) => {
                    warn!(rule_id = %id, path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(results)
    }

    /// Recursively collect YAML files, recording skipped entries.
    fn scan_dir_recursive(
        &self,
        dir: &Path,
        results: &mut Vec<LoadResult>,
        candidates: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results, candidates)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            candidates.push(path);
        }

        Ok(())
    }

    /// Parse a single YAML file into a [`RuleDocument`] via two-pass
    /// deserialization. `extends` is not resolved here.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        let envelope: RuleEnvelope = serde_yaml::from_str(&contents)?;
        parse_envelope(envelope)
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, DocumentMap> {
        self.documents.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, DocumentMap> {
        self.documents.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Get the shared documents map containing all rule kinds.
    pub fn documents(&self) -> Arc<RwLock<DocumentMap>> {
        Arc::clone(&self.documents)
    }

    pub fn get(&self, id: &str) -> Option<RuleDocument> {
        self.read_lock().get(id).cloned()
    }

    // ── Typed views ──────────────────────────────────────────────

    /// The enabled alert policy with the lexicographically smallest id, if any.
    pub fn alert_policy(&self) -> Option<CompiledAlertPolicy> {
        let guard = self.read_lock();
        let mut rules: Vec<_> = guard
            .values()
            .filter_map(RuleDocument::as_alert_policy)
            .filter(|r| r.metadata.enabled)
            .collect();
        rules.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        rules.into_iter().find_map(|r| match r.compile() {
            Ok(policy) => Some(policy),
            Err(e) => {
                warn!(rule_id = %r.metadata.id, error = %e, "alert policy rejected");
                None
            }
        })
    }

    /// Every enabled forecast profile that compiles, sorted by id.
    pub fn forecast_profiles(&self) -> Vec<CompiledForecastProfile> {
        let guard = self.read_lock();
        let mut out: Vec<_> = guard
            .values()
            .filter_map(RuleDocument::as_forecast_profile)
            .filter(|r| r.metadata.enabled)
            .filter_map(|r| match r.compile() {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(rule_id = %r.metadata.id, error = %e, "forecast profile rejected");
                    None
                }
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(profiles = out.len(), "forecast profiles compiled");
        out
    }

    /// Every enabled lexicon that compiles, sorted by id.
    pub fn lexicons(&self) -> Vec<CompiledLexicon> {
        let guard = self.read_lock();
        let mut rules: Vec<_> = guard
            .values()
            .filter_map(RuleDocument::as_sentiment_lexicon)
            .filter(|r| r.metadata.enabled)
            .collect();
        rules.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        rules
            .into_iter()
            .filter_map(|r| match r.compile() {
                Ok(l) => Some(l),
                Err(e) => {
                    warn!(rule_id = %r.metadata.id, error = %e, "lexicon rejected");
                    None
                }
            })
            .collect()
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Atomically write a rule document to a YAML file.
    ///
    /// Writes to a `.tmp` file first, then renames to the final path.
    pub fn write_document(&self, doc: &RuleDocument) -> Result<PathBuf> {
        let meta = doc.metadata();
        let final_path = self.rules_dir.join(format!("{}.yml", meta.id));
        let tmp_path = self.rules_dir.join(format!(".{}.tmp", meta.id));

        let yaml = doc.to_yaml()?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(rule_id = %meta.id, kind = %doc.kind(), path = %final_path.display(), "wrote rule file");

        self.write_lock().insert(meta.id.clone(), doc.clone());
        Ok(final_path)
    }

    /// Delete a rule file by rule ID, removing the in-memory entry too.
    pub fn delete_rule(&self, id: &str) -> Result<()> {
        let yml_path = self.rules_dir.join(format!("{}.yml", id));
        let yaml_path = self.rules_dir.join(format!("{}.yaml", id));

        let removed = if yml_path.exists() {
            fs::remove_file(&yml_path)?;
            true
        } else if yaml_path.exists() {
            fs::remove_file(&yaml_path)?;
            true
        } else {
            false
        };

        if !removed {
            return Err(RuleError::Validation(format!(
                "no rule file found for id '{}'",
                id
            )));
        }

        self.write_lock().remove(id);

        info!(rule_id = %id, "deleted rule");
        Ok(())
    }
}

fn read_raw(path: &Path) -> Result<(String, serde_yaml::Value)> {
    let contents = fs::read_to_string(path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
    let id = value
        .get("metadata")
        .and_then(|m| m.get("id"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RuleError::Validation("rule metadata.id must not be empty".to_string()))?
        .to_string();
    Ok((id, value))
}

fn parse_value(value: serde_yaml::Value) -> Result<RuleDocument> {
    let envelope: RuleEnvelope = serde_yaml::from_value(value)?;
    parse_envelope(envelope)
}

fn parse_envelope(envelope: RuleEnvelope) -> Result<RuleDocument> {
    if envelope.metadata.id.is_empty() {
        return Err(RuleError::Validation(
            "rule metadata.id must not be empty".to_string(),
        ));
    }
    envelope.parse_full().map_err(|e| {
        RuleError::Validation(format!(
            "failed to parse rule '{}': {}",
            envelope.metadata.id, e
        ))
    })
}

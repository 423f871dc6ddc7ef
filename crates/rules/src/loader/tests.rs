//! Tests for the rule loader module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::{RuleDocument, RuleKind};

const POLICY_YAML: &str = r#"
apiVersion: v1
kind: AlertPolicy
metadata:
  id: test-policy
  name: Test Policy
spec:
  negative_threshold: -0.6
  cooldown_minutes: 5
"#;

const BASE_PROFILE_YAML: &str = r#"
apiVersion: v1
kind: ForecastProfile
metadata:
  id: base
  name: Base
  enabled: false
spec:
  target: demand
  models: [holt_winters, autoregressive]
  horizon: 30
  confidence_level: 0.9
"#;

const CHILD_PROFILE_YAML: &str = r#"
apiVersion: v1
kind: ForecastProfile
metadata:
  id: occupancy
  name: Occupancy
  extends: base
spec:
  target: occupancy
  horizon: 7
"#;

fn temp_loader() -> (TempDir, RuleLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

fn loaded_ids(results: &[LoadResult]) -> Vec<String> {
    let mut ids: Vec<String> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { rule_id } => Some(rule_id.clone()),
            _ => None,
        })
        .collect();
    ids.sort();
    ids
}

#[test]
fn load_rule_from_file() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("test-policy.yml");
    fs::write(&path, POLICY_YAML).unwrap();

    let doc = loader.load_file(&path).unwrap();
    assert_eq!(doc.metadata().id, "test-policy");
    assert_eq!(doc.kind(), RuleKind::AlertPolicy);
    assert_eq!(doc.as_alert_policy().unwrap().spec.cooldown_minutes, 5);
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("policy.yml"), POLICY_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), POLICY_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let results = loader.load_all().unwrap();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded_ids(&results), vec!["test-policy"]);
    assert_eq!(skipped, 2);
    assert!(loader.documents().read().unwrap().contains_key("test-policy"));
}

#[test]
fn load_all_recurses_into_subdirectories() {
    let (dir, loader) = temp_loader();
    let nested = dir.path().join("forecast");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("base.yaml"), BASE_PROFILE_YAML).unwrap();
    fs::write(dir.path().join("policy.yml"), POLICY_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["base", "test-policy"]);
}

#[test]
fn extends_merges_parent_spec_but_not_metadata() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("base.yml"), BASE_PROFILE_YAML).unwrap();
    fs::write(dir.path().join("occupancy.yml"), CHILD_PROFILE_YAML).unwrap();
    loader.load_all().unwrap();

    let profiles = loader.forecast_profiles();
    // The base is disabled; the child stays enabled.
    assert_eq!(profiles.len(), 1);
    let p = &profiles[0];
    assert_eq!(p.id, "occupancy");
    assert_eq!(p.horizon, Some(7));
    assert_eq!(p.confidence_level, Some(0.9));
    assert_eq!(p.models, vec!["holt_winters", "autoregressive"]);
}

#[test]
fn missing_parent_fails_only_the_child() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("occupancy.yml"), CHILD_PROFILE_YAML).unwrap();
    fs::write(dir.path().join("policy.yml"), POLICY_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["test-policy"]);
    let failed = results
        .iter()
        .find(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .unwrap();
    assert!(failed.path.ends_with("occupancy.yml"));
}

#[test]
fn circular_extends_is_reported() {
    let (dir, loader) = temp_loader();
    let a = BASE_PROFILE_YAML.replace("enabled: false", "extends: occupancy");
    fs::write(dir.path().join("base.yml"), a).unwrap();
    fs::write(dir.path().join("occupancy.yml"), CHILD_PROFILE_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert!(loaded_ids(&results).is_empty());
    assert!(results.iter().all(|r| match &r.status {
        LoadStatus::Failed { error } => error.contains("circular"),
        _ => false,
    }));
}

#[test]
fn duplicate_ids_keep_the_first_file() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), POLICY_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), POLICY_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["test-policy"]);
    assert!(results
        .iter()
        .any(|r| matches!(&r.status, LoadStatus::Failed { error } if error.contains("duplicate"))));
}

#[test]
fn unknown_kind_fails_validation() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("weird.yml");
    fs::write(&path, POLICY_YAML.replace("AlertPolicy", "BookingRule")).unwrap();
    let err = loader.load_file(&path).unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
    assert!(err.to_string().contains("BookingRule"));
}

#[test]
fn write_then_delete_document() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("seed.yml"), POLICY_YAML).unwrap();
    let doc = loader.load_file(&dir.path().join("seed.yml")).unwrap();
    let mut rule = doc.as_alert_policy().unwrap().clone();
    rule.metadata.id = "written".into();

    let path = loader.write_document(&RuleDocument::AlertPolicy(rule)).unwrap();
    assert!(path.exists());
    assert!(!dir.path().join(".written.tmp").exists());
    assert!(loader.get("written").is_some());

    let reloaded = loader.load_file(&path).unwrap();
    assert_eq!(reloaded.metadata().id, "written");

    loader.delete_rule("written").unwrap();
    assert!(!path.exists());
    assert!(loader.get("written").is_none());
    assert!(loader.delete_rule("written").is_err());
}

#[test]
fn typed_views_compile_documents() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("policy.yml"), POLICY_YAML).unwrap();
    fs::write(
        dir.path().join("lexicon.yml"),
        include_str!("../../../../data/rules/lexicon/tourism-es.yml"),
    )
    .unwrap();
    loader.load_all().unwrap();

    let policy = loader.alert_policy().unwrap();
    assert_eq!(policy.negative_threshold, -0.6);
    assert_eq!(policy.consecutive_negative_limit, 3);

    let lexicons = loader.lexicons();
    assert_eq!(lexicons.len(), 1);
    assert_eq!(lexicons[0].language, "es");
}

#[test]
fn bundled_rules_directory_loads_cleanly() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/rules");
    let loader = RuleLoader::new(dir);
    let results = loader.load_all().unwrap();
    assert!(results
        .iter()
        .all(|r| !matches!(r.status, LoadStatus::Failed { .. })));
    let targets: Vec<_> = loader
        .forecast_profiles()
        .into_iter()
        .map(|p| p.target)
        .collect();
    assert_eq!(targets.len(), 3);
}

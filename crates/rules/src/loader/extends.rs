//! Deep-merge and `extends` inheritance resolution for YAML rules.

use std::collections::{HashMap, HashSet};

/// Maximum inheritance chain depth.
const MAX_EXTENDS_DEPTH: usize = 5;

/// Deep-merge two YAML `Value` maps: child fields win, arrays replace entirely.
pub fn deep_merge(parent: &serde_yaml::Value, child: &serde_yaml::Value) -> serde_yaml::Value {
    match (parent, child) {
        (serde_yaml::Value::Mapping(pm), serde_yaml::Value::Mapping(cm)) => {
            let mut merged = pm.clone();
            for (key, child_val) in cm {
                if let Some(parent_val) = pm.get(key) {
                    merged.insert(key.clone(), deep_merge(parent_val, child_val));
                } else {
                    merged.insert(key.clone(), child_val.clone());
                }
            }
            serde_yaml::Value::Mapping(merged)
        }
        (_, child) => child.clone(),
    }
}

/// Resolve `extends` chains for every rule in `raw_values`.
///
/// Fails on the first cycle, missing parent or over-deep chain.
pub fn resolve_extends(
    raw_values: &HashMap<String, serde_yaml::Value>,
) -> std::result::Result<HashMap<String, serde_yaml::Value>, String> {
    let mut resolved: HashMap<String, serde_yaml::Value> = HashMap::new();
    let mut in_progress: HashSet<String> = HashSet::new();

    for id in raw_values.keys() {
        resolve_single(id, raw_values, &mut resolved, &mut in_progress, 0)?;
    }

    Ok(resolved)
}

/// Resolve a single rule, so one broken chain does not take down the others.
pub fn resolve_one(
    id: &str,
    raw_values: &HashMap<String, serde_yaml::Value>,
) -> std::result::Result<serde_yaml::Value, String> {
    resolve_single(id, raw_values, &mut HashMap::new(), &mut HashSet::new(), 0)
}

fn resolve_single(
    id: &str,
    raw_values: &HashMap<String, serde_yaml::Value>,
    resolved: &mut HashMap<String, serde_yaml::Value>,
    in_progress: &mut HashSet<String>,
    depth: usize,
) -> std::result::Result<serde_yaml::Value, String> {
    if let Some(val) = resolved.get(id) {
        return Ok(val.clone());
    }

    if in_progress.contains(id) {
        return Err(format!("circular extends chain detected for rule '{}'", id));
    }

    if depth > MAX_EXTENDS_DEPTH {
        return Err(format!(
            "extends chain exceeds maximum depth ({}) for rule '{}'",
            MAX_EXTENDS_DEPTH, id
        ));
    }

    let raw = raw_values
        .get(id)
        .ok_or_else(|| format!("rule '{}' not found for extends resolution", id))?
        .clone();

    let metadata = raw.get("metadata").cloned();
    let parent_id = metadata
        .as_ref()
        .and_then(|meta| meta.get("extends"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let result = if let Some(ref parent_id) = parent_id {
        in_progress.insert(id.to_string());
        let parent_val = resolve_single(parent_id, raw_values, resolved, in_progress, depth + 1)?;
        in_progress.remove(id);
        let mut merged = deep_merge(&parent_val, &raw);
        // Metadata is never inherited: a disabled base must not disable its children.
        if let (serde_yaml::Value::Mapping(map), Some(meta)) = (&mut merged, metadata) {
            map.insert(serde_yaml::Value::String("metadata".into()), meta);
        }
        merged
    } else {
        raw
    };

    resolved.insert(id.to_string(), result.clone());
    Ok(result)
}

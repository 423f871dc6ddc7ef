//! File readers for the subcommands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use spirit_compute::ProductPricing;
use spirit_core::{Observation, TimeSeriesFrame};

/// Read a daily series. `.json` files hold an array of `{date, value}`;
/// anything else is read as `date,value` lines with an optional header.
pub fn read_series(path: &Path) -> Result<TimeSeriesFrame> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let observations = if is_json(path) {
        serde_json::from_str::<Vec<Observation>>(&raw)
            .with_context(|| format!("invalid observation JSON in {}", path.display()))?
    } else {
        parse_csv(&raw).with_context(|| format!("invalid series CSV in {}", path.display()))?
    };
    Ok(TimeSeriesFrame::from_observations(&observations)?)
}

pub fn read_products(path: &Path) -> Result<Vec<ProductPricing>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid product JSON in {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn parse_csv(raw: &str) -> Result<Vec<Observation>> {
    let mut out = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((date, value)) = line.split_once(',') else {
            bail!("line {}: expected `date,value`", lineno + 1);
        };
        let date = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            // Header row.
            Err(_) if out.is_empty() && lineno == 0 => continue,
            Err(e) => bail!("line {}: bad date '{}': {e}", lineno + 1, date.trim()),
        };
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad value '{}'", lineno + 1, value.trim()))?;
        out.push(Observation { date, value });
    }
    Ok(out)
}

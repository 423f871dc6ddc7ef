mod cli;
mod input;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use spirit_compute::{FeatureContext, PredictiveAnalytics};
use spirit_core::config::{load_dotenv, Config};
use spirit_core::PredictionTarget;
use spirit_multimodal::{Content, Modality, MultiModalTaskRouter, TaskExecutor, TaskType};
use spirit_notify::WebhookSubscriber;
use spirit_rules::RuleLoader;
use spirit_sentiment::types::Interaction;
use spirit_sentiment::{Language, SentimentService};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut config = match &args.profile {
        Some(p) => Config::for_profile(p),
        None => Config::from_env(),
    };
    if let Some(dir) = &args.rules_dir {
        config.rules_dir = dir.clone();
    }
    config.log_summary();

    let rules = load_rules(&config)?;

    match args.command {
        Command::Forecast {
            target,
            horizon,
            destination,
            anomalies_only,
            input,
        } => {
            let target: PredictionTarget = target.parse()?;
            let frame = input::read_series(&input)?;
            let analytics = PredictiveAnalytics::new(config.forecast.clone())
                .with_profiles(&rules.forecast_profiles())?;
            if anomalies_only {
                return emit(&analytics.detect_anomalies(&frame), args.pretty);
            }
            let ctx = destination
                .map(FeatureContext::for_destination)
                .unwrap_or_default();
            let result = match target {
                PredictionTarget::Occupancy => analytics.predict_occupancy(&frame, &ctx, horizon).await?,
                other => analytics.predict(other, &frame, &ctx, horizon).await?,
            };
            emit(&result, args.pretty)
        }

        Command::Pricing { input } => {
            let products = input::read_products(&input)?;
            let analytics = PredictiveAnalytics::new(config.forecast.clone());
            emit(&analytics.optimize_pricing(&products)?, args.pretty)
        }

        Command::Sentiment {
            language,
            customer,
            text,
        } => {
            let language: Language = language.parse()?;
            let service = SentimentService::from_rules(&config, &rules)?;
            if let Some(url) = &config.realtime.webhook_url {
                let webhook = WebhookSubscriber::from_config(url.clone(), None, None)
                    .context("invalid realtime webhook")?;
                service
                    .dispatcher()
                    .registry()
                    .subscribe("webhook", Arc::new(webhook))
                    .await;
            }
            let mut outcomes = Vec::with_capacity(text.len());
            for (i, message) in text.into_iter().enumerate() {
                let interaction = Interaction {
                    interaction_id: uuid::Uuid::new_v4().to_string(),
                    customer_id: customer.clone(),
                    text: message,
                    language,
                    channel: Some("cli".into()),
                };
                let outcome = service.process(&interaction).await?;
                if let Some(alert) = &outcome.alert {
                    warn!(index = i + 1, severity = ?alert.severity, "alert raised");
                }
                outcomes.push(outcome);
            }
            let summary = service.trend_summary(&customer);
            emit(
                &serde_json::json!({ "outcomes": outcomes, "trend": summary }),
                args.pretty,
            )
        }

        Command::Process {
            modality,
            tasks,
            text,
            file,
            language,
            timeout_secs,
        } => {
            let modality: Modality = modality.parse()?;
            let tasks = tasks
                .iter()
                .map(|t| t.parse::<TaskType>())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let mut content = match (text, file) {
                (Some(t), _) => Content::new(modality, t.into_bytes()),
                (None, Some(path)) => Content::new(
                    modality,
                    std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?,
                ),
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            if let Some(l) = language {
                content.language = Some(l.parse()?);
            }

            let service = SentimentService::from_rules(&config, &rules)?;
            let executor = TaskExecutor::new(spirit_multimodal::HeuristicProcessor::new(
                service.analyzer().clone(),
            ));
            let router = MultiModalTaskRouter::new(&config.multimodal, executor);
            let budget = Duration::from_secs(timeout_secs.unwrap_or(config.multimodal.timeout_secs));
            let results = router.process_with_timeout(content, &tasks, budget).await;
            let stats = router.stats();
            router.shutdown().await;
            let results = results?;
            emit(
                &serde_json::json!({ "results": results, "stats": stats }),
                args.pretty,
            )
        }
    }
}

/// Load the rules directory when it exists. Per-file failures are logged by
/// the loader and do not stop the command.
fn load_rules(config: &Config) -> Result<RuleLoader> {
    let loader = RuleLoader::new(config.rules_dir.clone());
    if config.rules_dir.is_dir() {
        let results = loader
            .load_all()
            .with_context(|| format!("failed to scan {}", config.rules_dir.display()))?;
        info!(files = results.len(), dir = %config.rules_dir.display(), "rules loaded");
    } else {
        info!(dir = %config.rules_dir.display(), "rules directory not found; using built-in defaults");
    }
    Ok(loader)
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

//! Forecasting, anomaly detection and pricing for the analytics core.
//!
//! The entry point is [`PredictiveAnalytics`]; everything below it is
//! public so the stages can be run and tested on their own.

pub mod algorithms;
pub mod facade;
pub mod models;
pub mod pipeline;
pub mod pricing;
pub mod store;
pub mod types;

pub use facade::{PredictiveAnalytics, TargetProfile};
pub use models::{ModelKind, ModelPerformance};
pub use pipeline::anomaly::{AnomalyDetector, SeriesKind};
pub use pipeline::features::{FeatureContext, FeatureEngineer};
pub use pipeline::metrics::PipelineMetrics;
pub use pipeline::ForecastPipeline;
pub use pricing::{PricingRecommendation, ProductPricing};
pub use store::{ModelStore, SharedModelStore};
pub use types::{
    AnomalyRecord, AnomalySeverity, BaselineComparison, ConfidenceInterval, DetectionMethod,
    PredictionConfig, PredictionResult,
};

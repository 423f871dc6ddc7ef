//! Numeric building blocks shared by the forecasting pipeline.

pub mod isolation_forest;
pub mod linear;
pub mod regression_tree;
pub mod stats;

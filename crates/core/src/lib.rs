pub mod config;
pub mod error;
pub mod series;
pub mod target;

pub use config::Config;
pub use error::*;
pub use series::{Observation, TimeSeriesFrame};
pub use target::PredictionTarget;

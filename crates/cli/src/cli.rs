use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Forecasting, pricing, sentiment and multi-modal processing for tour
/// operations data.
#[derive(Parser, Debug)]
#[command(name = "spirit-analytics", about = "Spirit Tours analytics core")]
pub struct CliArgs {
    /// Directory of YAML rule documents (overrides RULES_DIR)
    #[arg(long, global = true, env = "RULES_DIR")]
    pub rules_dir: Option<PathBuf>,

    /// Configuration profile, e.g. PROD
    #[arg(long, global = true, env = "SPIRIT_PROFILE")]
    pub profile: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Forecast a daily series read from a CSV (`date,value`) or JSON file
    Forecast {
        /// demand, revenue or occupancy
        #[arg(long, default_value = "demand")]
        target: String,

        /// Days to forecast (defaults to the target's profile)
        #[arg(long)]
        horizon: Option<usize>,

        /// Destination label for logs
        #[arg(long)]
        destination: Option<String>,

        /// Only run anomaly detection on the history
        #[arg(long)]
        anomalies_only: bool,

        input: PathBuf,
    },

    /// Optimize prices for the products in a JSON file
    Pricing { input: PathBuf },

    /// Analyze one customer message and evaluate alerts
    Sentiment {
        /// en or es
        #[arg(long, default_value = "en")]
        language: String,

        #[arg(long, default_value = "cli")]
        customer: String,

        /// Message text; several values are processed in order
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Run multi-modal tasks over a file or inline text
    Process {
        /// text, image, audio or video
        #[arg(long)]
        modality: String,

        /// Task to run; repeat for several
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,

        /// Inline text (text modality)
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        language: Option<String>,

        /// Per-call timeout in seconds (overrides MULTIMODAL_TIMEOUT_SECS)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

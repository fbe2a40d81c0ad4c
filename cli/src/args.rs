use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use nutrithali_core::domain::{
    common::{
        DEFAULT_DETAILED_MODEL, DEFAULT_FAST_MODEL, DEFAULT_GEMINI_BASE_URL, LLMConfig,
        NutriThaliConfig,
    },
    food_analysis::entities::MealCategory,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "nutrithali", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub gemini: GeminiArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Analyse a meal photo
    Scan {
        /// Path to the photo (JPEG, PNG or WebP)
        image: PathBuf,

        /// Replace the identified dish name before analysing
        #[arg(long)]
        dish_name: Option<String>,

        /// Portions to analyse instead of the identified ones, e.g. "100g Rice, 150g Dal"
        #[arg(long)]
        portions: Option<String>,

        /// Re-run the analysis once on the detailed model
        #[arg(long)]
        improve: bool,

        /// Save the result under this meal category
        #[arg(long)]
        save: Option<MealCategory>,
    },

    /// Analyse a free-text meal description
    Describe {
        text: String,

        /// Save the result under this meal category
        #[arg(long)]
        save: Option<MealCategory>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct GeminiArgs {
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "base-url", env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub base_url: String,

    #[arg(long = "fast-model", env = "GEMINI_FAST_MODEL", default_value = DEFAULT_FAST_MODEL)]
    pub fast_model: String,

    #[arg(long = "detailed-model", env = "GEMINI_DETAILED_MODEL", default_value = DEFAULT_DETAILED_MODEL)]
    pub detailed_model: String,

    /// Per-request timeout in seconds; unset means no timeout
    #[arg(long = "timeout-secs", env = "GEMINI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LogArgs {
    #[arg(
        long = "log-filter",
        env = "LOG_FILTER",
        name = "LOG_FILTER",
        default_value = "info"
    )]
    pub filter: String,

    #[arg(long = "log-json", env = "LOG_JSON", name = "LOG_JSON", default_value_t = false)]
    pub json: bool,
}

impl From<Args> for NutriThaliConfig {
    fn from(args: Args) -> Self {
        NutriThaliConfig {
            llm: LLMConfig {
                api_key: args.gemini.api_key,
                base_url: args.gemini.base_url,
                fast_model: args.gemini.fast_model,
                detailed_model: args.gemini.detailed_model,
                request_timeout: args.gemini.timeout_secs.map(Duration::from_secs),
            },
        }
    }
}

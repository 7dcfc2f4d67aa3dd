//! Iris inference service CLI
//!
//! A command-line tool for checking health, inspecting and reloading the
//! model, running predictions and demonstrating a deployed service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{demo, health, metrics, model, predict};

/// Iris inference service CLI
#[derive(Parser)]
#[command(name = "iris")]
#[command(author, version, about = "CLI for the Iris inference service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via IRIS_API_URL env var)
    #[arg(long, env = "IRIS_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service health
    Health,

    /// Inspect or reload the model
    #[command(subcommand)]
    Model(ModelCommands),

    /// Classify one flower
    Predict {
        /// Sepal length, sepal width, petal length, petal width (cm)
        #[arg(num_args = 4, value_names = ["SEPAL_LENGTH", "SEPAL_WIDTH", "PETAL_LENGTH", "PETAL_WIDTH"], allow_negative_numbers = true)]
        features: Vec<f64>,
    },

    /// Print Prometheus metrics
    Metrics,

    /// Run the end-to-end demonstration
    Demo {
        /// Number of requests in the performance run
        #[arg(long, default_value_t = 50)]
        requests: usize,
    },
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Show the active model
    Info,

    /// Reload the model from its source
    Reload,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Health => health::show_health(&client, cli.format).await?,
        Commands::Model(model_cmd) => match model_cmd {
            ModelCommands::Info => model::show_info(&client, cli.format).await?,
            ModelCommands::Reload => model::reload(&client, cli.format).await?,
        },
        Commands::Predict { features } => predict::predict(&client, features, cli.format).await?,
        Commands::Metrics => metrics::show_metrics(&client).await?,
        Commands::Demo { requests } => demo::run(&client, requests).await?,
    }

    Ok(())
}

//! Health check command

use anyhow::{Context, Result};
use colored::Colorize;

use crate::client::{describe_provenance, ApiClient, Health};
use crate::output::{color_status, print_json, OutputFormat};

/// Fetch health; a 503 still carries a health body
pub async fn fetch_health(client: &ApiClient) -> Result<Health> {
    let response = client.get_raw("health").await?;
    serde_json::from_value(response.body)
        .with_context(|| format!("Unexpected health response ({})", response.status))
}

/// Show service health; fails when the service is unhealthy
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = fetch_health(client).await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Service Health".bold());
            println!("{}", "=".repeat(40));
            println!("Status:       {}", color_status(&health.status));
            println!("Model loaded: {}", health.model_loaded);
            if let Some(info) = &health.model_info {
                println!("Model:        {}", describe_provenance(info).cyan());
            }
            println!("Version:      {}", health.version);
            println!("Timestamp:    {}", health.timestamp);
            if let Some(error) = &health.error {
                println!("Error:        {}", error.red());
            }
        }
    }

    if !health.model_loaded {
        anyhow::bail!("Service is unhealthy");
    }
    Ok(())
}

//! Model management commands

use anyhow::Result;
use colored::Colorize;

use crate::client::{describe_provenance, ApiClient, ModelInfo, ReloadResponse};
use crate::output::{print_json, print_success, OutputFormat};

/// Show the active model
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("model/info").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Model Information".bold());
            println!("{}", "=".repeat(40));
            println!("Source:   {}", describe_provenance(&info.model_info).cyan());
            println!("Type:     {}", info.model_type);
            println!("Version:  {}", info.model_version);
            println!("Features: {}", info.feature_names.join(", "));
            println!("Classes:  {}", info.target_names.join(", "));
        }
    }

    Ok(())
}

/// Ask the service to reload its model
pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: ReloadResponse = client.post_empty("model/reload").await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&response.message);
            println!("Model: {}", describe_provenance(&response.model_info).cyan());
        }
    }

    Ok(())
}

//! Prediction command

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, PredictRequest, PredictResponse};
use crate::output::{color_confidence, format_confidence, print_json, OutputFormat};

/// Row for the probability table
#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Send one prediction request
pub async fn request(client: &ApiClient, features: &[f64]) -> Result<PredictResponse> {
    client
        .post(
            "predict",
            &PredictRequest {
                features: features.to_vec(),
            },
        )
        .await
}

/// Classify one flower and print the result
pub async fn predict(client: &ApiClient, features: Vec<f64>, format: OutputFormat) -> Result<()> {
    let response = request(client, &features).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            println!(
                "Prediction: {} (class {}, confidence {})",
                response.prediction.class_name.bold(),
                response.prediction.class_id,
                color_confidence(response.prediction.confidence)
            );

            let rows: Vec<ProbabilityRow> = response
                .probabilities
                .iter()
                .map(|(class, p)| ProbabilityRow {
                    class: class.to_string(),
                    probability: format_confidence(p),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

//! End-to-end demonstration of a running service
//!
//! Runs health, model info, sample predictions, error handling, a small
//! sequential load test and a metrics scrape, then prints a summary. The
//! command fails when any check fails.

use anyhow::Result;
use colored::Colorize;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Instant;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, ModelInfo};
use crate::commands::{health::fetch_health, metrics::sample_lines, predict};
use crate::output::{
    color_confidence, color_status, print_error, print_header, print_info, print_success,
};

/// Labelled samples with the class they should receive
pub const SAMPLES: [([f64; 4], &str); 6] = [
    ([5.1, 3.5, 1.4, 0.2], "setosa"),
    ([7.0, 3.2, 4.7, 1.4], "versicolor"),
    ([6.3, 3.3, 6.0, 2.5], "virginica"),
    ([4.9, 3.0, 1.4, 0.2], "setosa"),
    ([6.4, 3.2, 4.5, 1.5], "versicolor"),
    ([6.9, 3.1, 5.4, 2.1], "virginica"),
];

/// Required share of correct sample predictions
pub const MIN_ACCURACY: f64 = 0.8;

/// Required share of successful load-test requests
pub const MIN_SUCCESS_RATE: f64 = 0.95;

/// Bodies the service must reject with 400
pub fn error_cases() -> Vec<(&'static str, Value)> {
    vec![
        ("Missing features", json!({"wrong_field": [1, 2, 3, 4]})),
        ("Wrong feature count", json!({"features": [1, 2, 3]})),
        ("Non-numeric features", json!({"features": ["a", "b", "c", "d"]})),
        ("Empty features", json!({"features": []})),
    ]
}

/// Row for the summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Run every check against the service
pub async fn run(client: &ApiClient, requests: usize) -> Result<()> {
    print_header("Iris Inference API Demonstration");
    println!("Testing API at: {}", client.base_url());
    println!("Time: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    let results = vec![
        ("Health", check_health(client).await),
        ("Model info", check_model_info(client).await),
        ("Predictions", check_predictions(client).await),
        ("Error handling", check_error_handling(client).await),
        ("Performance", check_performance(client, requests).await),
        ("Metrics", check_metrics(client).await),
    ];

    print_header("Summary");
    let passed = results.iter().filter(|(_, ok)| *ok).count();
    let rows: Vec<SummaryRow> = results
        .iter()
        .map(|(check, ok)| SummaryRow {
            check: check.to_string(),
            result: color_status(if *ok { "PASS" } else { "FAIL" }),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("\n{}/{} checks passed", passed, results.len());

    if passed == results.len() {
        print_success("All checks passed");
        Ok(())
    } else {
        print_error(&format!("{} checks failed", results.len() - passed));
        anyhow::bail!("Demo failed")
    }
}

async fn check_health(client: &ApiClient) -> bool {
    print_header("Health");
    match fetch_health(client).await {
        Ok(health) if health.model_loaded => {
            print_success("Health check passed");
            println!("   Status: {}", color_status(&health.status));
            println!("   Version: {}", health.version);
            println!("   Timestamp: {}", health.timestamp);
            true
        }
        Ok(health) => {
            print_error(&format!(
                "Service unhealthy: {}",
                health.error.unwrap_or_default()
            ));
            false
        }
        Err(e) => {
            print_error(&format!("Health check failed: {:#}", e));
            false
        }
    }
}

async fn check_model_info(client: &ApiClient) -> bool {
    print_header("Model Info");
    match client.get::<ModelInfo>("model/info").await {
        Ok(info) => {
            print_success("Model info retrieved");
            println!("   Model type: {}", info.model_type);
            println!("   Features: {}", info.feature_names.join(", "));
            println!("   Classes: {}", info.target_names.join(", "));
            true
        }
        Err(e) => {
            print_error(&format!("Model info failed: {:#}", e));
            false
        }
    }
}

async fn check_predictions(client: &ApiClient) -> bool {
    print_header("Predictions");
    let mut correct = 0;

    for (i, (features, expected)) in SAMPLES.iter().enumerate() {
        println!("\nCase {}/{}: {:?} (expected {})", i + 1, SAMPLES.len(), features, expected);
        match predict::request(client, features).await {
            Ok(response) => {
                let predicted = &response.prediction.class_name;
                println!(
                    "   Predicted: {} (confidence {})",
                    predicted.bold(),
                    color_confidence(response.prediction.confidence)
                );
                if predicted.as_str() == *expected {
                    print_success("Correct prediction");
                    correct += 1;
                } else {
                    print_error("Incorrect prediction");
                }
            }
            Err(e) => print_error(&format!("Prediction failed: {:#}", e)),
        }
    }

    let accuracy = correct as f64 / SAMPLES.len() as f64;
    println!(
        "\nAccuracy: {}/{} ({:.1}%)",
        correct,
        SAMPLES.len(),
        accuracy * 100.0
    );
    accuracy > MIN_ACCURACY
}

async fn check_error_handling(client: &ApiClient) -> bool {
    print_header("Error Handling");
    let cases = error_cases();
    let mut rejected = 0;

    for (name, body) in &cases {
        println!("\nCase: {}", name);
        match client.post_raw("predict", body).await {
            Ok(response) if response.status == StatusCode::BAD_REQUEST => {
                print_success("Correctly returned 400");
                if let Some(error) = response.body.get("error").and_then(Value::as_str) {
                    println!("   Error message: {}", error);
                }
                rejected += 1;
            }
            Ok(response) => print_error(&format!("Expected 400, got {}", response.status)),
            Err(e) => print_error(&format!("Request failed: {:#}", e)),
        }
    }

    rejected == cases.len()
}

async fn check_performance(client: &ApiClient, requests: usize) -> bool {
    print_header("Performance");
    print_info(&format!("Running {} prediction requests...", requests));

    let start = Instant::now();
    let mut successes = 0;
    for i in 0..requests {
        let (features, _) = SAMPLES[i % SAMPLES.len()];
        if predict::request(client, &features).await.is_ok() {
            successes += 1;
        }
        if (i + 1) % 10 == 0 {
            println!("   Completed {}/{} requests...", i + 1, requests);
        }
    }
    let elapsed = start.elapsed().as_secs_f64();

    println!("\n   Total time: {:.2} seconds", elapsed);
    println!("   Successful requests: {}/{}", successes, requests);
    if requests > 0 && elapsed > 0.0 {
        println!(
            "   Average response time: {:.1} ms",
            elapsed * 1000.0 / requests as f64
        );
        println!("   Requests per second: {:.1}", requests as f64 / elapsed);
    }

    meets_success_rate(successes, requests)
}

async fn check_metrics(client: &ApiClient) -> bool {
    print_header("Metrics");
    // Metrics are optional on the service side; only report.
    match client.get_text("metrics").await {
        Ok(Some(text)) => {
            print_success("Metrics endpoint accessible");
            let samples: Vec<&str> = sample_lines(&text).collect();
            println!("   Found {} metric samples", samples.len());
            for line in samples.iter().take(10) {
                println!("     {}", line);
            }
        }
        Ok(None) => print_info("Prometheus metrics not available"),
        Err(e) => print_info(&format!("Metrics endpoint not accessible: {:#}", e)),
    }
    true
}

/// True when at least [`MIN_SUCCESS_RATE`] of `total` requests succeeded
pub fn meets_success_rate(successes: usize, total: usize) -> bool {
    successes as f64 >= total as f64 * MIN_SUCCESS_RATE
}

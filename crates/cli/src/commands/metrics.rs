//! Metrics command

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::print_warning;

/// Print the Prometheus exposition text
pub async fn show_metrics(client: &ApiClient) -> Result<()> {
    match client.get_text("metrics").await? {
        Some(text) => print!("{}", text),
        None => print_warning("Prometheus metrics not available"),
    }
    Ok(())
}

/// Metric samples in an exposition, ignoring comments and blank lines
pub fn sample_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_lines_skip_comments() {
        let text = "# HELP predictions_total Total predictions made\n\
                    # TYPE predictions_total counter\n\
                    predictions_total{model_version=\"local\"} 3\n\
                    \n\
                    model_load_duration_seconds_count 1\n";
        let samples: Vec<_> = sample_lines(text).collect();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].starts_with("predictions_total"));
    }
}

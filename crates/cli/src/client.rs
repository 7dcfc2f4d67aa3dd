//! API client for communicating with the inference service

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use url::Url;

/// API client for the inference service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Status and body of a request whose failure is an expected outcome
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// GET and return whatever status comes back
    pub async fn get_raw(&self, path: &str) -> Result<RawResponse> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::raw(response).await
    }

    /// POST a JSON body and return whatever status comes back
    pub async fn post_raw<B: Serialize>(&self, path: &str, body: &B) -> Result<RawResponse> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::raw(response).await
    }

    async fn raw(response: reqwest::Response) -> Result<RawResponse> {
        let status = response.status();
        let text = response.text().await.context("Failed to read response")?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(RawResponse { status, body })
    }

    /// GET a plain-text body; `None` when the service answers 503
    pub async fn get_text(&self, path: &str) -> Result<Option<String>> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response
            .text()
            .await
            .map(Some)
            .context("Failed to read response")
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
    pub model_loaded: bool,
    pub model_info: Option<Value>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f64,
}

/// JSON object of numbers, kept in the order the service sent it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues(pub Vec<(String, f64)>);

impl NamedValues {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NamedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedValuesVisitor;

        impl<'de> Visitor<'de> for NamedValuesVisitor {
            type Value = NamedValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NamedValues, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, f64>()? {
                    entries.push(entry);
                }
                Ok(NamedValues(entries))
            }
        }

        deserializer.deserialize_map(NamedValuesVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
    pub probabilities: NamedValues,
    pub input_features: NamedValues,
    pub model_info: Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_info: Value,
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
    pub model_type: String,
    pub model_version: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub message: String,
    pub model_info: Value,
    pub timestamp: String,
}

/// One-line description of a `model_info` object
pub fn describe_provenance(info: &Value) -> String {
    let field = |name: &str| info.get(name).and_then(Value::as_str).unwrap_or("?");
    match info.get("source").and_then(Value::as_str) {
        Some("model_registry") => format!("registry {} v{}", field("name"), field("version")),
        Some("experiment_run") => {
            let accuracy = info.get("accuracy").and_then(Value::as_f64).unwrap_or(0.0);
            format!("run {} (accuracy {:.3})", field("run_id"), accuracy)
        }
        Some("local_file") => format!("local file {}", field("file")),
        _ => "unknown".to_string(),
    }
}

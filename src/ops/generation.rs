use std::time::Duration;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use anyhow::{Result, anyhow};
use reqwest::Client;

use crate::ops::{NodeOperation, SocketValues};

const MAX_ERROR_BODY: usize = 200;

/// Explicit handle to the external generation APIs. Constructed once and
/// shared by the generation operations; the request timeout lives here,
/// at the collaborator boundary.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GenerationClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(anyhow!("generation API returned {}: {}", status, excerpt));
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Calls the text generation API with the prompt input.
#[derive(Debug)]
pub struct GenerateTextOp {
    client: GenerationClient,
}

impl GenerateTextOp {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeOperation for GenerateTextOp {
    async fn run(&self, inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let prompt = inputs
            .get("prompt")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("missing 'prompt' input"))?;

        let mut body = json!({ "prompt": prompt });
        if let Some(model) = config.get("model") {
            body["model"] = model.clone();
        }

        let response = self.client.post("v1/generate/text", &body).await?;
        let text = response
            .get("text")
            .cloned()
            .ok_or_else(|| anyhow!("generation API response is missing 'text'"))?;

        let mut out = SocketValues::new();
        out.insert("text".to_string(), text);
        Ok(out)
    }
}

/// Calls the image generation API with the prompt and settings inputs.
#[derive(Debug)]
pub struct GenerateImageOp {
    client: GenerationClient,
}

impl GenerateImageOp {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeOperation for GenerateImageOp {
    async fn run(&self, inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let prompt = inputs
            .get("prompt")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("missing 'prompt' input"))?;
        let settings = inputs.get("settings").cloned().unwrap_or(json!({}));

        let mut body = json!({ "prompt": prompt, "settings": settings });
        if let Some(model) = config.get("model") {
            body["model"] = model.clone();
        }

        let response = self.client.post("v1/generate/image", &body).await?;
        let image = response
            .get("image")
            .cloned()
            .ok_or_else(|| anyhow!("generation API response is missing 'image'"))?;

        let mut out = SocketValues::new();
        out.insert("image".to_string(), image);
        Ok(out)
    }
}

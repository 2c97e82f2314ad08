//! OpenAI-compatible chat client for the scoring oracle.

use crate::Result;
use crate::config::ScoringConfig;
use crate::error::CutterError;
use crate::services::scoring::{
    EvaluationRequest, EvaluationResponse, ScoringOracle, build_evaluation_prompt,
    parse_evaluation,
};
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time;

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry_attempts: u32,
    retry_delay_ms: u64,
    base_url: String,
}

impl OpenAiOracle {
    /// Create a new oracle client.
    pub fn new(
        api_key: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        retry_attempts: u32,
        retry_delay_ms: u64,
        base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            model,
            temperature,
            max_tokens,
            retry_attempts,
            retry_delay_ms,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from unified configuration.
    ///
    /// Fails with `MissingCredential` when no API key is configured — the
    /// check happens here, before any request is built.
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(CutterError::MissingCredential)?;

        Self::validate_base_url(&config.base_url)?;

        Ok(Self::new(
            api_key.to_string(),
            config.model.clone(),
            config.temperature,
            config.max_tokens,
            config.retry_attempts,
            config.retry_delay_ms,
            config.base_url.clone(),
        ))
    }

    /// Validate base URL format.
    fn validate_base_url(base_url: &str) -> Result<()> {
        use url::Url;
        let parsed = Url::parse(base_url)
            .map_err(|e| CutterError::config(format!("Invalid base URL: {}", e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CutterError::config(
                "Base URL must use http or https protocol".to_string(),
            ));
        }

        if parsed.host().is_none() {
            return Err(CutterError::config(
                "Base URL must contain a valid hostname".to_string(),
            ));
        }

        Ok(())
    }

    async fn chat_completion(&self, messages: Vec<Value>) -> Result<String> {
        let request_body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body);
        let response = self.make_request_with_retry(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CutterError::OracleProtocol {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let envelope: Value =
            serde_json::from_str(&body).map_err(|e| CutterError::OracleParse {
                message: e.to_string(),
                body: body.clone(),
            })?;
        let content = envelope["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CutterError::OracleShape {
                message: "chat reply carries no message content".to_string(),
                body: body.clone(),
            })?;
        trace!("oracle reply: {} chars", content.len());

        Ok(content.to_string())
    }

    async fn make_request_with_retry(
        &self,
        request: reqwest::RequestBuilder,
    ) -> reqwest::Result<reqwest::Response> {
        let mut attempts = 0;
        loop {
            match request.try_clone().unwrap().send().await {
                Ok(resp) => return Ok(resp),
                Err(_e) if attempts < self.retry_attempts => {
                    attempts += 1;
                    debug!("oracle request failed, retry {attempts}/{}", self.retry_attempts);
                    time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ScoringOracle for OpenAiOracle {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse> {
        let prompt = build_evaluation_prompt(request);
        let messages = vec![
            json!({"role": "system", "content": "You are a professional video editor who ranks alternative takes of spoken lines and always answers with the requested JSON."}),
            json!({"role": "user", "content": prompt}),
        ];
        let response = self.chat_completion(messages).await?;
        parse_evaluation(&response)
    }
}

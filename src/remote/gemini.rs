use crate::error::{ReconcileError, Result};
use crate::ocr::OcrEngine;
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde_json::json;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini-backed OCR engine: sends the document inline with the
/// instruction and returns the model's text response.
pub struct GeminiOcr {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiOcr {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API endpoint, for tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl OcrEngine for GeminiOcr {
    async fn extract_text(
        &self,
        document: &[u8],
        file_name: &str,
        prompt: &str,
    ) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(ReconcileError::OcrFailure(
                "Gemini API key is not configured".to_string(),
            ));
        }

        let mime_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string();

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": BASE64_STANDARD.encode(document),
                        }
                    },
                    { "text": prompt },
                ]
            }]
        });

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReconcileError::OcrFailure(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(ReconcileError::OcrFailure(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ReconcileError::OcrFailure(e.to_string()))?;

        let text = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                ReconcileError::OcrFailure("Gemini response contained no text".to_string())
            })?;

        Ok(text.to_string())
    }
}

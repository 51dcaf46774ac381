//! services/api/src/adapters/translate.rs
//!
//! This module contains the adapter for the third-party machine-translation
//! provider. It implements the `Translator` port from the `core` crate
//! against a LibreTranslate-compatible HTTP API.

use async_trait::async_trait;
use serde::Deserialize;
use wordtrail_core::ports::{PortError, PortResult, Translator};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `Translator` over a LibreTranslate-style
/// `/translate` endpoint.
#[derive(Clone)]
pub struct LibreTranslateAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl LibreTranslateAdapter {
    /// Creates a new `LibreTranslateAdapter`.
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

//=========================================================================================
// `Translator` Trait Implementation
//=========================================================================================

#[async_trait]
impl Translator for LibreTranslateAdapter {
    async fn translate(&self, term: &str, from: &str, to: &str) -> PortResult<String> {
        let mut payload = serde_json::json!({
            "q": term,
            "source": from,
            "target": to,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            payload["api_key"] = serde_json::Value::String(key.clone());
        }

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "translation provider returned {}",
                response.status()
            )));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(body.translated_text)
    }
}

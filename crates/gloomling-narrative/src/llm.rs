//! LLM backends for narrative text.
//!
//! Enum dispatch over the two supported HTTP APIs: OpenAI-compatible chat
//! completions and the Anthropic Messages API. Both receive the same
//! system instruction and a single user prompt rendered by the core's
//! prompt templates, and both return plain text.

use gloomling_core::config::NarrativeConfig;

use crate::error::NarrativeError;

/// System instruction shared by every backend.
pub const SYSTEM_PROMPT: &str = "You voice a small, unsettling creature kept as a pet. \
Reply with one or two short sentences of plain prose. No quotation marks, no lists.";

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Sampling temperature.
    pub temperature: f32,
    /// Output length cap.
    pub max_tokens: u32,
}

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that turns a prompt into text.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Backend`] if the HTTP call fails or the
    /// response cannot be extracted.
    pub async fn complete(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt, sampling).await,
            Self::Anthropic(backend) => backend.complete(prompt, sampling).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

/// Connection details shared by both backends.
struct Endpoint {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl Endpoint {
    fn new(config: &NarrativeConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key,
            model: config.model.clone(),
        }
    }
}

/// Read a non-success response into a backend error.
async fn status_error(provider: &str, response: reqwest::Response) -> NarrativeError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_owned());
    NarrativeError::Backend(format!("{provider} returned {status}: {body}"))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    endpoint: Endpoint,
}

impl OpenAiBackend {
    async fn complete(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError> {
        let endpoint = &self.endpoint;
        let url = format!("{}/chat/completions", endpoint.api_url);

        let body = serde_json::json!({
            "model": endpoint.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens
        });

        let response = endpoint
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", endpoint.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Backend(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("OpenAI", response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NarrativeError::Backend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, NarrativeError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            NarrativeError::Backend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// The system instruction is a top-level field and the key travels in
/// `x-api-key`. Text comes back in `content[0].text`.
pub struct AnthropicBackend {
    endpoint: Endpoint,
}

impl AnthropicBackend {
    async fn complete(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError> {
        let endpoint = &self.endpoint;
        let url = format!("{}/messages", endpoint.api_url);

        let body = serde_json::json!({
            "model": endpoint.model,
            "max_tokens": sampling.max_tokens,
            "temperature": sampling.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = endpoint
            .client
            .post(&url)
            .header("x-api-key", &endpoint.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Backend(format!("Anthropic request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("Anthropic", response).await);
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            NarrativeError::Backend(format!("Anthropic response parse failed: {e}"))
        })?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, NarrativeError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            NarrativeError::Backend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// # Errors
///
/// Returns [`NarrativeError::Config`] when the backend name is unknown or
/// no API key is configured.
pub fn create_backend(config: &NarrativeConfig) -> Result<LlmBackend, NarrativeError> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| NarrativeError::Config("narrative API key is not set".to_owned()))?
        .to_owned();
    let endpoint = Endpoint::new(config, api_key);

    match config.backend.trim().to_lowercase().as_str() {
        "openai" => Ok(LlmBackend::OpenAi(OpenAiBackend { endpoint })),
        "anthropic" => Ok(LlmBackend::Anthropic(AnthropicBackend { endpoint })),
        other => Err(NarrativeError::Config(format!("unknown narrative backend: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str, key: Option<&str>) -> NarrativeConfig {
        NarrativeConfig {
            enabled: true,
            backend: backend.to_owned(),
            api_key: key.map(ToOwned::to_owned),
            ..NarrativeConfig::default()
        }
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {"content": "It hums at the bottom of its jar."}
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.unwrap_or_default().contains("hums"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{"type": "text", "text": "A wet little sigh."}]
        });
        let result = extract_anthropic_content(&json);
        assert!(result.unwrap_or_default().contains("sigh"));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let openai = create_backend(&config("openai", Some("k")));
        assert_eq!(openai.map(|b| b.name().to_owned()).ok().as_deref(), Some("openai-compatible"));

        let anthropic = create_backend(&config("Anthropic", Some("k")));
        assert_eq!(anthropic.map(|b| b.name().to_owned()).ok().as_deref(), Some("anthropic"));
    }

    #[test]
    fn create_backend_requires_key_and_known_name() {
        assert!(matches!(
            create_backend(&config("openai", None)),
            Err(NarrativeError::Config(_))
        ));
        assert!(matches!(
            create_backend(&config("openai", Some("  "))),
            Err(NarrativeError::Config(_))
        ));
        assert!(matches!(
            create_backend(&config("llama", Some("k"))),
            Err(NarrativeError::Config(_))
        ));
    }
}

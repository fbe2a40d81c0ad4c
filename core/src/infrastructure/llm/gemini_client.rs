use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::{
    common::{LLMConfig, entities::app_errors::CoreError},
    food_analysis::{
        entities::ModelTier,
        ports::{CredentialSource, LLMClient},
        prompts::PromptPayload,
    },
};

const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GeminiLLMClient<C> {
    credentials: C,
    base_url: String,
    fast_model: String,
    detailed_model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl From<PromptPayload> for GeminiRequest {
    fn from(payload: PromptPayload) -> Self {
        let mut parts = vec![Part::Text { text: payload.text }];
        if let Some(image) = payload.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            });
        }

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE.to_string(),
                response_schema: payload.response_schema,
            },
        }
    }
}

impl<C: CredentialSource> GeminiLLMClient<C> {
    pub fn new(credentials: C, config: &LLMConfig) -> Result<Self, CoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            CoreError::TransportError(e.to_string())
        })?;

        Ok(Self {
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fast_model: config.fast_model.clone(),
            detailed_model: config.detailed_model.clone(),
            client,
        })
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Detailed => &self.detailed_model,
        }
    }

    fn endpoint(&self, model: &str, api_key: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(&format!("{}/models/{}:generateContent", self.base_url, model))
            .map_err(|e| {
                error!("Invalid Gemini endpoint for model {}: {}", model, e);
                CoreError::InvalidEndpoint(e.to_string())
            })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::InvalidEndpoint(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }

        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    async fn call_gemini_api(&self, url: Url, request: &GeminiRequest) -> Result<String, CoreError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                // The error's URL carries the key.
                CoreError::TransportError(e.without_url().to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read Gemini response body: {}", e);
            CoreError::TransportError(e.without_url().to_string())
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            error!("Gemini API error: {} - {}", status, body);
            return Err(CoreError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        let gemini_response: GeminiResponse = serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CoreError::MalformedEnvelope(e.to_string())
        })?;

        gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                error!("Gemini response has no candidate text");
                CoreError::MalformedEnvelope("response has no candidate text".to_string())
            })
    }
}

impl<C: CredentialSource> LLMClient for GeminiLLMClient<C> {
    async fn send(
        &self,
        tier: ModelTier,
        payload: PromptPayload,
        cancel: CancellationToken,
    ) -> Result<String, CoreError> {
        let Some(api_key) = self.credentials.api_key() else {
            warn!("No Gemini API key configured");
            return Err(CoreError::NoCredential);
        };

        let model = self.model_for(tier);
        let url = self.endpoint(model, &api_key)?;
        let request = GeminiRequest::from(payload);

        debug!(model, "Calling Gemini generateContent");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(model, "Gemini request cancelled");
                Err(CoreError::Cancelled)
            }
            response = self.call_gemini_api(url, &request) => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::food_analysis::prompts::InlineImage;
    use crate::infrastructure::credentials::StaticCredentialSource;

    fn client(base_url: &str) -> GeminiLLMClient<StaticCredentialSource> {
        let config = LLMConfig {
            base_url: base_url.to_string(),
            ..LLMConfig::default()
        };
        GeminiLLMClient::new(StaticCredentialSource::new(Some("k".to_string())), &config)
            .unwrap()
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GeminiRequest::from(PromptPayload {
            text: "Identify this dish".to_string(),
            image: Some(InlineImage {
                mime_type: "image/jpeg".to_string(),
                data: "aGVsbG8=".to_string(),
            }),
            response_schema: json!({"type": "OBJECT"}),
        });

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        {"text": "Identify this dish"},
                        {"inline_data": {"mime_type": "image/jpeg", "data": "aGVsbG8="}}
                    ]
                }],
                "generationConfig": {
                    "response_mime_type": "application/json",
                    "response_schema": {"type": "OBJECT"}
                }
            })
        );
    }

    #[test]
    fn test_endpoint_selects_model_and_appends_key() {
        let client = client("https://example.test/v1beta/");
        let url = client
            .endpoint(client.model_for(ModelTier::Detailed), "secret key")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-3-pro-preview:generateContent?key=secret+key"
        );
    }

    #[test]
    fn test_endpoint_rejects_malformed_base() {
        let client = client("not a url");
        let result = client.endpoint("gemini-3-flash-preview", "k");
        assert!(matches!(result, Err(CoreError::InvalidEndpoint(_))));
    }
}

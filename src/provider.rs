//! HTTP client for the OpenAI-compatible inference provider
//!
//! Two calls only: the model listing used by discovery and a one-token
//! completion probe used to verify loadability. Both carry an explicit
//! request timeout so a hung provider cannot wedge a load.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response shape of `GET /v1/models`
#[derive(Debug, Deserialize)]
struct ModelListResponse {
    #[serde(default)]
    data: Vec<ModelListEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelListEntry {
    id: String,
}

#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    model: &'a str,
    messages: [ProbeMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ProbeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Client for the provider's listing and probe endpoints
#[derive(Debug, Clone)]
pub struct ProviderClient {
    base_url: String,
    timeout: Duration,
}

impl ProviderClient {
    /// Create a client for the given base URL (e.g. `http://localhost:1234/v1`)
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }

    /// Fetch the identities of all models the provider can serve
    ///
    /// Any response that does not carry the expected `data` array is treated
    /// as an empty listing rather than an error.
    pub async fn list_models(&self) -> reqwest::Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let response = self.client()?.get(&url).send().await?.error_for_status()?;

        let listing: ModelListResponse = match response.json().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed model listing, treating as empty");
                return Ok(Vec::new());
            }
        };

        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }

    /// Verify a model can serve a request with a minimal one-token completion
    pub async fn probe(&self, model_id: &str) -> reqwest::Result<()> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ProbeRequest {
            model: model_id,
            messages: [ProbeMessage {
                role: "user",
                content: "test",
            }],
            max_tokens: 1,
        };

        self.client()?
            .post(&url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ProviderClient::new("http://localhost:1234/v1/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
    }

    #[test]
    fn test_probe_payload_shape() {
        let payload = ProbeRequest {
            model: "llama-3.2-3b-instruct",
            messages: [ProbeMessage {
                role: "user",
                content: "test",
            }],
            max_tokens: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "llama-3.2-3b-instruct");
        assert_eq!(json["max_tokens"], 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_listing_parses_expected_shape() {
        let raw = r#"{"object":"list","data":[{"id":"m1","object":"model"},{"id":"m2"}]}"#;
        let listing: ModelListResponse = serde_json::from_str(raw).unwrap();
        let ids: Vec<_> = listing.data.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_listing_without_data_is_empty() {
        let raw = r#"{"object":"list"}"#;
        let listing: ModelListResponse = serde_json::from_str(raw).unwrap();
        assert!(listing.data.is_empty());
    }

    #[tokio::test]
    async fn test_list_models_unreachable_provider() {
        // Port 1 is reserved and refuses connections immediately
        let client = ProviderClient::new("http://127.0.0.1:1/v1", Duration::from_secs(1));
        assert!(client.list_models().await.is_err());
    }

    #[tokio::test]
    async fn test_probe_unreachable_provider() {
        let client = ProviderClient::new("http://127.0.0.1:1/v1", Duration::from_secs(1));
        assert!(client.probe("any-model").await.is_err());
    }
}

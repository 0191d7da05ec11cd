use crate::error::SearchError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings shared by the embedding and chat clients.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: Url,
    pub api_key: String,
}

impl OpenAiConfig {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::Request("OpenAI API key is empty".to_string()));
        }

        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        Ok(Self {
            base_url: Url::parse(&normalized)?,
            api_key,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        Ok(self.base_url.join(path)?)
    }
}

pub(crate) async fn post_json<B, R>(
    client: &Client,
    config: &OpenAiConfig,
    path: &str,
    body: &B,
) -> Result<R, SearchError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(config.endpoint(path)?)
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::backend("openai", format!("{status}: {body}")));
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_version_prefix() {
        let config = OpenAiConfig::new("https://api.openai.com/v1", "sk-test").unwrap();
        assert_eq!(
            config.endpoint("embeddings").unwrap().as_str(),
            "https://api.openai.com/v1/embeddings"
        );

        let config = OpenAiConfig::new("http://localhost:8080/v1/", "sk-test").unwrap();
        assert_eq!(
            config.endpoint("chat/completions").unwrap().as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            OpenAiConfig::new(DEFAULT_BASE_URL, "  "),
            Err(SearchError::Request(_))
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            OpenAiConfig::new("not a url", "sk-test"),
            Err(SearchError::Url(_))
        ));
    }
}

use anyhow::{bail, Context};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use report_rag_core::Answer;
use serde_json::Value;
use std::path::Path;

/// Terminal stand-in for the upload/chat UI: every call goes through the API.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn upload(&self, file: &Path) -> anyhow::Result<Value> {
        let filename = file
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("path has no file name: {}", file.display()))?
            .to_string();
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let response = self
            .client
            .post(self.url("/ingest"))
            .multipart(Form::new().part("file", part))
            .send()
            .await?;

        success_json(response).await
    }

    pub async fn ask(&self, question: &str) -> anyhow::Result<Answer> {
        let response = self
            .client
            .post(self.url("/query"))
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await?;

        Ok(serde_json::from_value(success_json(response).await?)?)
    }

    pub async fn reset(&self) -> anyhow::Result<Value> {
        let response = self.client.delete(self.url("/reset")).send().await?;
        success_json(response).await
    }
}

async fn success_json(response: Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        bail!("API returned {status}: {body}");
    }
    serde_json::from_str(&body).with_context(|| format!("API returned non-JSON body: {body}"))
}

pub fn print_answer(question: &str, answer: &Answer) {
    println!("You: {question}");
    println!("Assistant: {}", answer.answer);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            println!("  - {} (page {})", source.source, source.page);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_not_doubled() {
        let client = ApiClient::new("http://127.0.0.1:8000/");
        assert_eq!(client.url("/query"), "http://127.0.0.1:8000/query");
    }
}

use anyhow::{bail, Context, Result};
use reqwest::{Client, Method};
use serde_json::Value;

/// Thin JSON client for the mesh-server API.
pub struct MeshClient {
    http: Client,
    base_url: String,
}

impl MeshClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        let status = response.status();
        let json: Value = response
            .json()
            .await
            .with_context(|| format!("Invalid JSON from {}", url))?;

        if !status.is_success() {
            bail!("{} answered {}: {}", url, status, json);
        }
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = MeshClient::new("http://localhost:5000/");
        assert_eq!(client.url("/nodes"), "http://localhost:5000/nodes");
    }
}

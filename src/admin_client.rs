// Client side of the server's admin routes, used by `qupal key ...`.

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::ADMIN_TOKEN_HEADER;

pub struct AdminClient {
    http: Client,
    server: String,
    token: String,
}

impl AdminClient {
    pub fn new(server: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/api/admin/api-key", self.server)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .header(ADMIN_TOKEN_HEADER, &self.token)
            .send()
            .await
            .context(format!("Failed to reach QUPAL server at {}", self.server))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Server rejected admin request ({}): {}", status, body);
        }
        Ok(response)
    }

    pub async fn set_key(&self, api_key: &str) -> Result<()> {
        debug!(server = %self.server, "Setting API key");
        self.send(self.http.put(self.url()).json(&json!({ "api_key": api_key })))
            .await
            .map(|_| ())
    }

    pub async fn clear_key(&self) -> Result<()> {
        debug!(server = %self.server, "Clearing API key");
        self.send(self.http.delete(self.url())).await.map(|_| ())
    }

    pub async fn status(&self) -> Result<Value> {
        let url = format!("{}/api/admin/status", self.server);
        self.send(self.http.get(url))
            .await?
            .json()
            .await
            .context("Failed to parse status response")
    }
}

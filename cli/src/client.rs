// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for the admin surface of a running registry node

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use hibiscus_registry_core::domain::api_key::KeyScope;
use hibiscus_registry_core::domain::registry::RegistrySummary;
use hibiscus_registry_core::infrastructure::federation_client::API_KEY_HEADER;

#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Response of `POST /tokens`. The secret is shown exactly once.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub scope: KeyScope,
    pub secret: String,
}

#[derive(Debug, Default, Serialize)]
pub struct PeerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub clear_api_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RegistryClient {
    /// `host` may be a bare host name or a full `http(s)://` origin.
    pub fn new(host: &str, port: u16, api_key: Option<String>) -> Result<Self> {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host.trim_end_matches('/'), port)
        } else {
            format!("http://{}:{}", host, port)
        };
        Self::from_base_url(base_url, api_key)
    }

    pub fn from_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn check(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        anyhow::bail!("Failed to {} (HTTP {}): {}", action, status.as_u16(), message);
    }

    pub async fn health(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .with_context(|| format!("Failed to reach registry at {}", self.base_url))?;

        Self::check(response, "check health")
            .await?
            .json()
            .await
            .context("Failed to parse health response")
    }

    pub async fn list_peers(&self) -> Result<Vec<RegistrySummary>> {
        let response = self
            .request(self.client.get(format!("{}/federated-registries", self.base_url)))
            .send()
            .await
            .context("Failed to list federated registries")?;

        Self::check(response, "list federated registries")
            .await?
            .json()
            .await
            .context("Failed to parse registry list")
    }

    pub async fn add_peer(&self, name: &str, url: &str, api_key: Option<String>) -> Result<RegistrySummary> {
        #[derive(Serialize)]
        struct AddRequest<'a> {
            name: &'a str,
            url: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            api_key: Option<String>,
        }

        let response = self
            .request(self.client.post(format!("{}/federated-registries", self.base_url)))
            .json(&AddRequest { name, url, api_key })
            .send()
            .await
            .context("Failed to add federated registry")?;

        Self::check(response, "add federated registry")
            .await?
            .json()
            .await
            .context("Failed to parse registry")
    }

    pub async fn get_peer(&self, id: Uuid) -> Result<RegistrySummary> {
        let response = self
            .request(
                self.client
                    .get(format!("{}/federated-registries/{}", self.base_url, id)),
            )
            .send()
            .await
            .context("Failed to get federated registry")?;

        Self::check(response, "get federated registry")
            .await?
            .json()
            .await
            .context("Failed to parse registry")
    }

    pub async fn update_peer(&self, id: Uuid, update: &PeerUpdate) -> Result<RegistrySummary> {
        let response = self
            .request(
                self.client
                    .patch(format!("{}/federated-registries/{}", self.base_url, id)),
            )
            .json(update)
            .send()
            .await
            .context("Failed to update federated registry")?;

        Self::check(response, "update federated registry")
            .await?
            .json()
            .await
            .context("Failed to parse registry")
    }

    pub async fn probe_peer(&self, id: Uuid) -> Result<RegistrySummary> {
        let response = self
            .request(
                self.client
                    .post(format!("{}/federated-registries/{}/probe", self.base_url, id)),
            )
            .send()
            .await
            .context("Failed to probe federated registry")?;

        Self::check(response, "probe federated registry")
            .await?
            .json()
            .await
            .context("Failed to parse registry")
    }

    pub async fn remove_peer(&self, id: Uuid) -> Result<()> {
        let response = self
            .request(
                self.client
                    .delete(format!("{}/federated-registries/{}", self.base_url, id)),
            )
            .send()
            .await
            .context("Failed to remove federated registry")?;

        Self::check(response, "remove federated registry").await?;
        Ok(())
    }

    pub async fn issue_key(&self, name: &str, owner: &str, scope: KeyScope) -> Result<IssuedKeyResponse> {
        #[derive(Serialize)]
        struct IssueRequest<'a> {
            name: &'a str,
            owner: &'a str,
            scope: KeyScope,
        }

        let response = self
            .request(self.client.post(format!("{}/tokens", self.base_url)))
            .json(&IssueRequest { name, owner, scope })
            .send()
            .await
            .context("Failed to issue API key")?;

        Self::check(response, "issue API key")
            .await?
            .json()
            .await
            .context("Failed to parse issued key")
    }

    pub async fn revoke_key(&self, id: Uuid) -> Result<()> {
        let response = self
            .request(self.client.delete(format!("{}/tokens/{}", self.base_url, id)))
            .send()
            .await
            .context("Failed to revoke API key")?;

        Self::check(response, "revoke API key").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard, key: Option<&str>) -> RegistryClient {
        RegistryClient::from_base_url(server.url(), key.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_base_url_forms() {
        let bare = RegistryClient::new("10.0.0.5", 8000, None).unwrap();
        assert_eq!(bare.base_url(), "http://10.0.0.5:8000");

        let full = RegistryClient::new("https://registry.example.org/", 443, None).unwrap();
        assert_eq!(full.base_url(), "https://registry.example.org:443");
    }

    #[tokio::test]
    async fn test_list_peers_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("GET", "/federated-registries")
            .match_header(API_KEY_HEADER, "admin-secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!([{
                    "id": id,
                    "name": "Partner",
                    "url": "https://partner.example.org",
                    "has_api_key": true,
                    "status": "reachable",
                    "enabled": true,
                    "created_at": "2026-01-01T00:00:00Z",
                    "last_checked_at": null
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let peers = client_for(&server, Some("admin-secret")).list_peers().await.unwrap();
        mock.assert_async().await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].name, "Partner");
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", mockito::Matcher::Regex("^/federated-registries/.*".to_string()))
            .with_status(403)
            .with_body(r#"{"error":"this operation requires an admin key"}"#)
            .create_async()
            .await;

        let err = client_for(&server, Some("read-only"))
            .remove_peer(Uuid::new_v4())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("requires an admin key"));
    }
}

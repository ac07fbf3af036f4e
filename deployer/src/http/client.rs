//! HTTP client implementation

use std::time::Duration;

use http::StatusCode;
use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::{DeployerError, RemoteError};
use crate::storage::settings::CoolifySettings;

/// HTTP client for the Coolify API
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_token: SecretString,
    pub(crate) deploy_server_uuid: String,
    pub(crate) docker_image: Option<String>,
    pub(crate) build_pack: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(settings: &CoolifySettings) -> Result<Self, DeployerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: SecretString::from(settings.api_token.clone()),
            deploy_server_uuid: settings.deploy_server_uuid.clone(),
            docker_image: settings.docker_image.clone().filter(|image| !image.is_empty()),
            build_pack: settings.build_pack.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_json("GET", response).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        Self::read_json("POST", response).await
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_token.expose_secret())
    }

    async fn read_json<T: DeserializeOwned>(
        method: &str,
        response: Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(classify_failure(status, &body));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Map a non-success answer onto the remote error taxonomy
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let detail = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => body.trim().to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(detail),
        _ => RemoteError::Rejected {
            status: status.as_u16(),
            detail,
        },
    }
}

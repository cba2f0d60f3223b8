//! HTTP transport to the section catalog api.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use classplan_core::{ApiRequest, ClassplanError, ClassplanResult, Method, Transport};
use url::Url;

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(api_url).with_context(|| format!("Invalid api url '{api_url}'"))?;

        // Url::join drops the last path segment unless it ends in a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> ClassplanResult<Vec<u8>> {
        let url = self
            .base_url
            .join(&request.uri)
            .map_err(|e| ClassplanError::Transport(format!("{}: {e}", request.uri)))?;

        let params = request.params.pairs();
        let builder = match request.method {
            Method::Get => self.http.get(url).query(&params),
            Method::Post => self.http.post(url).form(&params),
        };

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassplanError::Timeout(self.timeout.as_secs())
            } else {
                ClassplanError::Transport(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            return Err(ClassplanError::Status {
                uri: request.uri.clone(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ClassplanError::Transport(e.to_string()))?;

        Ok(body.to_vec())
    }
}

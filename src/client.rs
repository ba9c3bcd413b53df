//! Client for the coordinator's public HTTP API

use crate::common::{encode_key, Error, Result};
use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Clone)]
pub struct FileClient {
    base: String,
    client: reqwest::Client,
}

impl FileClient {
    /// `base` is the coordinator URL, e.g. `http://127.0.0.1:8888`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/?filename={}", self.base, encode_key(name))
    }

    async fn check(resp: reqwest::Response, expected: StatusCode) -> Result<reqwest::Response> {
        if resp.status() == expected {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::UnexpectedStatus { status, body })
    }

    /// Upload `data` as `name`. Fails with the coordinator's status on 4xx/5xx.
    pub async fn put(&self, name: &str, data: impl Into<Bytes>) -> Result<()> {
        let resp = self
            .client
            .put(self.file_url(name))
            .body(data.into())
            .send()
            .await?;
        Self::check(resp, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    /// Download `name`.
    pub async fn get(&self, name: &str) -> Result<Bytes> {
        let resp = self.client.get(self.file_url(name)).send().await?;
        let resp = Self::check(resp, StatusCode::OK).await?;
        Ok(resp.bytes().await?)
    }

    /// Cluster overview from `/admin/status`.
    pub async fn status(&self) -> Result<Value> {
        let resp = self
            .client
            .get(format!("{}/admin/status", self.base))
            .send()
            .await?;
        let resp = Self::check(resp, StatusCode::OK).await?;
        Ok(resp.json().await?)
    }
}

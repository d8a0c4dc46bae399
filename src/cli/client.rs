//! HTTP client for a running vgsales API

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::analytics::{AggregateReport, FilterOptions, FilterQuery};
use crate::inference::{PredictionOutcome, PredictionRequest};
use crate::server::HealthStatus;

pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> anyhow::Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = body["error"].as_str().unwrap_or("request failed");
            bail!("{} returned {}: {}", path, status, message);
        }
        resp.json()
            .await
            .with_context(|| format!("unexpected response from {}", path))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .with_context(|| format!("could not reach {}", self.base))?;
        Self::decode(path, resp).await
    }

    pub async fn health(&self) -> anyhow::Result<HealthStatus> {
        self.get("/health", &[]).await
    }

    pub async fn filter_options(&self) -> anyhow::Result<FilterOptions> {
        self.get("/filter-options", &[]).await
    }

    pub async fn aggregate(&self, filter: &FilterQuery) -> anyhow::Result<AggregateReport> {
        let mut query: Vec<(&str, String)> = filter
            .genres
            .iter()
            .map(|g| ("genres", g.clone()))
            .collect();
        query.push(("start", filter.start.to_string()));
        query.push(("end", filter.end.to_string()));
        self.get("/aggregate", &query).await
    }

    pub async fn predict(&self, request: &PredictionRequest) -> anyhow::Result<PredictionOutcome> {
        let resp = self
            .http
            .post(self.url("/predict"))
            .json(request)
            .send()
            .await
            .with_context(|| format!("could not reach {}", self.base))?;
        Self::decode("/predict", resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_api_prefix() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8000/api/health");
    }
}

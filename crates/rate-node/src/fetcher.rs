use crate::rate_source::RateFetcher;
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::info;
use twd_fx_common::SourceError;

/// reqwest 기반 환율 API 클라이언트
pub struct HttpRateFetcher {
    client: Client,
}

impl HttpRateFetcher {
    /// 요청 타임아웃과 User-Agent를 지정해 클라이언트를 만듭니다
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    async fn fetch_json(&self, endpoint: &Url) -> Result<Value, SourceError> {
        info!("🌐 Calling rate API: {}", endpoint);

        let response = self
            .client
            .get(endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Network(format!("HTTP {}", status)));
        }

        // 본문 수신 실패는 Network, 파싱 실패는 Parse
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

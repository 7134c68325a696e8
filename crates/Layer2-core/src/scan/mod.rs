//! Scanners - URL 생존 확인 / 열린 포트 탐색

use async_trait::async_trait;
use berth_foundation::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

// ============================================================================
// URL Scanner
// ============================================================================

/// URL 확인 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStatus {
    pub url: String,
    pub live: bool,
}

/// URL 생존 확인기
#[async_trait]
pub trait UrlScanner: Send + Sync {
    /// 동시에 최대 `max`개까지 요청하며, 결과는 입력 순서를 유지합니다.
    async fn scan(&self, urls: &[String], max: usize) -> Vec<UrlStatus>;
}

/// 살아있는 URL만 추림
pub fn live_urls(statuses: Vec<UrlStatus>) -> Vec<String> {
    statuses
        .into_iter()
        .filter(|s| s.live)
        .map(|s| s.url)
        .collect()
}

/// HTTP 요청 기반 확인기. 응답이 오면 (상태 코드와 무관하게) 살아있는 것으로 봅니다.
#[derive(Debug, Clone)]
pub struct HttpUrlScanner {
    client: reqwest::Client,
}

impl HttpUrlScanner {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // 로컬 개발 인증서는 대부분 자체 서명
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn probe(client: reqwest::Client, url: String) -> UrlStatus {
        match client.get(&url).send().await {
            Ok(response) => {
                trace!(url = %url, status = %response.status(), "URL is live");
                UrlStatus { url, live: true }
            }
            Err(e) => {
                debug!(url = %url, "URL is not reachable: {}", e);
                UrlStatus { url, live: false }
            }
        }
    }
}

#[async_trait]
impl UrlScanner for HttpUrlScanner {
    async fn scan(&self, urls: &[String], max: usize) -> Vec<UrlStatus> {
        stream::iter(urls.to_vec())
            .map(|url| Self::probe(self.client.clone(), url))
            .buffered(max.max(1))
            .collect()
            .await
    }
}

// ============================================================================
// Port Scanner
// ============================================================================

/// 열린 호스트 포트 탐색기
#[async_trait]
pub trait PortScanner: Send + Sync {
    /// 후보를 순서대로 확인해 처음으로 사용 가능한 포트 반환
    async fn first_open(&self, candidates: &[u16]) -> Option<u16>;
}

/// 실제로 bind를 시도하는 탐색기
#[derive(Debug, Clone)]
pub struct TcpPortScanner {
    host: String,
}

impl Default for TcpPortScanner {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
        }
    }
}

impl TcpPortScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

#[async_trait]
impl PortScanner for TcpPortScanner {
    async fn first_open(&self, candidates: &[u16]) -> Option<u16> {
        for &port in candidates {
            match tokio::net::TcpListener::bind((self.host.as_str(), port)).await {
                Ok(_listener) => {
                    debug!(port, "Found open port");
                    return Some(port);
                }
                Err(e) if is_port_taken(&e) => trace!(port, "Port unavailable: {}", e),
                Err(e) => {
                    // 권한 부족 등은 다른 프로세스가 점유한 것이 아님
                    debug!(port, "Port not bindable by this process, treating as open: {}", e);
                    return Some(port);
                }
            }
        }
        None
    }
}

/// 이미 다른 소켓이 점유 중인 경우만 사용 불가로 봅니다
fn is_port_taken(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::AddrInUse
}

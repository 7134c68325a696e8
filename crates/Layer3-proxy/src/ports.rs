//! Port negotiation
//!
//! ```text
//! needs_protocol_scan ──▶ 하나라도 필요? ──yes──▶ 프로토콜별 병렬 스캔 → 마지막 값에 병합
//!                              │
//!                              no
//!                              ▼
//!                    프록시 컨테이너 실행 중? ──no──▶ 전체 스캔
//!                              │
//!                             yes ──▶ 마지막 포트 재사용
//! ```

use crate::unit::PROXY_SERVICE;
use berth_core::Runtime;
use berth_foundation::{BerthConfig, Error, ProxyPorts, Result};
use tracing::{debug, info};

/// 프로토콜별 스캔 필요 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolStatus {
    pub http: bool,
    pub https: bool,
}

impl ProtocolStatus {
    /// 두 프로토콜 모두 스캔
    pub fn all() -> Self {
        Self {
            http: true,
            https: true,
        }
    }

    pub fn none() -> Self {
        Self {
            http: false,
            https: false,
        }
    }

    pub fn any(&self) -> bool {
        self.http || self.https
    }
}

/// 원하는 포트와 마지막으로 확정된 포트를 비교
///
/// 마지막 값이 없거나 원하는 값과 다른 프로토콜은 다시 스캔해야 합니다.
pub fn needs_protocol_scan(current: &ProxyPorts, last: Option<&ProxyPorts>) -> ProtocolStatus {
    let Some(last) = last else {
        return ProtocolStatus::all();
    };

    ProtocolStatus {
        http: last.http.is_none() || current.http != last.http,
        https: last.https.is_none() || current.https != last.https,
    }
}

/// 스캔 결과 중 필요하지 않았던 프로토콜은 버립니다
async fn scan_ports(runtime: &Runtime, status: ProtocolStatus) -> ProxyPorts {
    let config = runtime.config();
    let scanner = runtime.port_scanner();
    let http_candidates = config.proxy_scan_http();
    let https_candidates = config.proxy_scan_https();

    let (http, https) = futures::join!(
        scanner.first_open(&http_candidates),
        scanner.first_open(&https_candidates)
    );
    debug!(?http, ?https, "Scanned proxy ports");

    ProxyPorts {
        http: if status.http { http } else { None },
        https: if status.https { https } else { None },
    }
}

/// 프록시가 사용할 포트 결정
///
/// 반환값의 프로토콜이 `None`이면 열린 포트를 찾지 못한 것입니다.
/// [`ensure_resolved`]로 확인하세요.
pub async fn find_proxy_ports(
    runtime: &Runtime,
    status: ProtocolStatus,
    last: Option<ProxyPorts>,
) -> Result<ProxyPorts> {
    let config = runtime.config();

    if status.any() {
        let scanned = scan_ports(runtime, status).await;
        let mut ports = last.unwrap_or_else(|| config.proxy_current_ports());
        if status.http {
            ports.http = scanned.http;
        }
        if status.https {
            ports.https = scanned.https;
        }
        return Ok(ports);
    }

    let engine = runtime.engine();
    let mut running = false;
    for container in engine.list(None).await? {
        let is_proxy = container.name == config.proxy_container
            || (container.project == config.proxy_name && container.service == PROXY_SERVICE);
        if is_proxy && engine.is_running(&container.id).await? {
            running = true;
            break;
        }
    }

    if running {
        debug!(container = %config.proxy_container, "Reusing last known proxy ports");
        Ok(last.unwrap_or_default())
    } else {
        info!(container = %config.proxy_container, "Proxy container is gone, rescanning ports");
        Ok(scan_ports(runtime, ProtocolStatus::all()).await)
    }
}

/// 확정되지 않은 프로토콜이 있으면 시도한 후보 전부를 담아 실패
pub fn ensure_resolved(ports: &ProxyPorts, config: &BerthConfig) -> Result<(u16, u16)> {
    match (ports.http, ports.https) {
        (Some(http), Some(https)) => Ok((http, https)),
        (http, https) => {
            let mut tried = Vec::new();
            if http.is_none() {
                tried.extend(config.proxy_scan_http());
            }
            if https.is_none() {
                tried.extend(config.proxy_scan_https());
            }
            let tried: Vec<String> = tried.iter().map(u16::to_string).collect();
            Err(Error::Negotiation(format!(
                "could not detect an open port amongst: {}",
                tried.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::testing::{FixedPortScanner, RecordingEngine};
    use berth_core::{Container, ContainerMetadata};
    use std::sync::Arc;

    fn runtime(engine: RecordingEngine, scanner: FixedPortScanner) -> (Arc<Runtime>, Arc<FixedPortScanner>) {
        let scanner = Arc::new(scanner);
        let runtime = Runtime::builder(BerthConfig::default())
            .with_engine(Arc::new(engine))
            .with_port_scanner(scanner.clone())
            .with_cache(Arc::new(berth_foundation::MemoryCache::new()))
            .with_plugin_roots(vec![])
            .build()
            .unwrap();
        (runtime, scanner)
    }

    fn proxy_container() -> Container {
        Container {
            id: "p1".into(),
            name: "berthproxy_proxy_1".into(),
            project: "berthproxy".into(),
            service: "proxy".into(),
        }
    }

    #[test]
    fn test_needs_scan_without_history() {
        let current = ProxyPorts::new(80, 443);
        assert_eq!(needs_protocol_scan(&current, None), ProtocolStatus::all());
    }

    #[test]
    fn test_needs_scan_per_protocol() {
        let current = ProxyPorts::new(80, 443);
        let last = ProxyPorts::new(8000, 443);
        assert_eq!(
            needs_protocol_scan(&current, Some(&last)),
            ProtocolStatus {
                http: true,
                https: false
            }
        );
        assert_eq!(
            needs_protocol_scan(&current, Some(&current)),
            ProtocolStatus::none()
        );
    }

    #[tokio::test]
    async fn test_partial_rescan_keeps_cached_https() {
        let (runtime, _) = runtime(RecordingEngine::new(), FixedPortScanner::new([8080, 443]));

        let ports = find_proxy_ports(
            &runtime,
            ProtocolStatus {
                http: true,
                https: false,
            },
            Some(ProxyPorts::new(8000, 8443)),
        )
        .await
        .unwrap();

        assert_eq!(ports, ProxyPorts::new(8080, 8443));
    }

    #[tokio::test]
    async fn test_missing_container_forces_scan() {
        let (runtime, scanner) = runtime(RecordingEngine::new(), FixedPortScanner::new([80, 443]));

        let ports = find_proxy_ports(&runtime, ProtocolStatus::none(), Some(ProxyPorts::new(8000, 8443)))
            .await
            .unwrap();

        assert_eq!(ports, ProxyPorts::new(80, 443));
        assert_eq!(scanner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_running_container_reuses_last_ports() {
        let engine = RecordingEngine::new().with_container(
            proxy_container(),
            ContainerMetadata::default(),
            true,
        );
        let (runtime, scanner) = runtime(engine, FixedPortScanner::new([80, 443]));

        let ports = find_proxy_ports(&runtime, ProtocolStatus::none(), Some(ProxyPorts::new(8000, 8443)))
            .await
            .unwrap();

        assert_eq!(ports, ProxyPorts::new(8000, 8443));
        assert!(scanner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_container_forces_scan() {
        let engine = RecordingEngine::new().with_container(
            proxy_container(),
            ContainerMetadata::default(),
            false,
        );
        let (runtime, scanner) = runtime(engine, FixedPortScanner::new([80, 443]));

        let ports = find_proxy_ports(&runtime, ProtocolStatus::none(), Some(ProxyPorts::new(8000, 8443)))
            .await
            .unwrap();

        assert_eq!(ports, ProxyPorts::new(80, 443));
        assert_eq!(scanner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_port_lists_candidates() {
        let (runtime, _) = runtime(RecordingEngine::new(), FixedPortScanner::new([443]));
        let config = runtime.config();

        let ports = find_proxy_ports(&runtime, ProtocolStatus::all(), None).await.unwrap();
        let err = ensure_resolved(&ports, config).unwrap_err();

        assert_eq!(
            err.to_string(),
            Error::Negotiation("could not detect an open port amongst: 80, 8000, 8080, 8888, 8008".into())
                .to_string()
        );
    }
}

//! Proxy routes - `proxy:` 설정을 traefik 라벨과 접속 URL로 변환

use berth_foundation::{Error, ProxyPorts, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{error, warn};

/// 라우트 URL 기본 포트
pub const DEFAULT_ROUTE_PORT: u16 = 80;

static ROUTE_PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn route_pattern() -> Result<&'static Regex> {
    ROUTE_PATTERN
        .get_or_init(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://)?([^:/\s]+)(?::(\d+))?(/\S*)?$"))
        .as_ref()
        .map_err(|e| Error::Internal(e.to_string()))
}

// ============================================================================
// RouteUrl
// ============================================================================

/// `host[:port][/path]` 형태의 라우트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteUrl {
    pub host: String,
    /// 컨테이너 쪽 포트
    pub port: u16,
    pub path: Option<String>,
}

impl RouteUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let caps = route_pattern()?
            .captures(url.trim())
            .ok_or_else(|| Error::Validation(format!("invalid proxy url: {}", url)))?;

        let port = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| Error::Validation(format!("invalid port in proxy url: {}", url)))?,
            None => DEFAULT_ROUTE_PORT,
        };
        let path = caps
            .get(3)
            .map(|m| m.as_str().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            host: caps[1].to_string(),
            port,
            path,
        })
    }

    /// traefik 1.x frontend rule
    pub fn frontend_rule(&self) -> String {
        match &self.path {
            Some(path) => format!("Host:{};PathPrefix:{}", self.host, path),
            None => format!("Host:{}", self.host),
        }
    }
}

// ============================================================================
// ServiceRoute
// ============================================================================

/// 한 서비스의 라우팅 라벨
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute {
    pub service: String,
    pub labels: BTreeMap<String, String>,
}

/// URL별로 몇 개의 서비스가 차지하는지
pub fn url_counts(proxy: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for url in proxy.values().flatten() {
        *counts.entry(url.clone()).or_insert(0) += 1;
    }
    counts
}

/// 둘 이상의 서비스에 할당된 URL
pub fn duplicate_urls(proxy: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    url_counts(proxy)
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(url, _)| url)
        .collect()
}

/// 서비스별 traefik 라벨 생성
///
/// 잘못된 URL은 로그를 남기고 건너뜁니다. 유효한 URL이 하나도 없는 서비스는 제외됩니다.
pub fn parse_config(proxy: &BTreeMap<String, Vec<String>>, network: &str) -> Result<Vec<ServiceRoute>> {
    let mut routes = Vec::new();

    for (service, urls) in proxy {
        let mut labels = BTreeMap::new();
        let mut index = 0;

        for url in urls {
            let route = match RouteUrl::parse(url) {
                Ok(route) => route,
                Err(Error::Validation(reason)) => {
                    error!(service = %service, "Skipping proxy route: {}", reason);
                    continue;
                }
                Err(e) => return Err(e),
            };
            labels.insert(format!("traefik.{}.frontend.rule", index), route.frontend_rule());
            labels.insert(format!("traefik.{}.port", index), route.port.to_string());
            index += 1;
        }

        if index == 0 {
            warn!(service = %service, "No valid proxy routes, skipping service");
            continue;
        }

        labels.insert("traefik.enable".to_string(), "true".to_string());
        labels.insert("traefik.docker.network".to_string(), network.to_string());
        routes.push(ServiceRoute {
            service: service.clone(),
            labels,
        });
    }

    Ok(routes)
}

/// 라우트에서 호스트 쪽 접속 URL 도출 (표준 포트는 생략)
pub fn route_info_urls(urls: &[String], ports: &ProxyPorts) -> Vec<String> {
    let mut out = Vec::new();
    for url in urls {
        let Ok(route) = RouteUrl::parse(url) else {
            continue;
        };
        let path = route.path.as_deref().unwrap_or("");

        let candidates = [
            ("http", ports.http, 80),
            ("https", ports.https, 443),
        ];
        for (scheme, port, standard) in candidates {
            let Some(port) = port else { continue };
            let url = if port == standard {
                format!("{}://{}{}", scheme, route.host, path)
            } else {
                format!("{}://{}:{}{}", scheme, route.host, port, path)
            };
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}

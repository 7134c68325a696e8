//! Service info and warnings

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 기본 서비스 타입
pub const DEFAULT_SERVICE_TYPE: &str = "docker-compose";

/// 서비스 하나의 조회 정보. 플러그인이 자유롭게 필드를 추가할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,

    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(rename = "type", default = "default_type")]
    pub kind: String,

    /// None = 알 수 없음
    #[serde(default)]
    pub healthy: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_type() -> String {
    DEFAULT_SERVICE_TYPE.to_string()
}

impl ServiceInfo {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            urls: Vec::new(),
            kind: default_type(),
            healthy: None,
            extra: Map::new(),
        }
    }

    /// 중복 없이 URL 추가
    pub fn add_urls<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            if !self.urls.contains(&url) {
                self.urls.push(url);
            }
        }
    }
}

/// 서비스별 기본값 위에 기존 정보를 얹습니다.
///
/// 기존 항목이 이기며, 서비스 목록에 없는 기존 항목은 뒤에 보존됩니다.
pub fn seed_info(services: &[String], previous: Vec<ServiceInfo>) -> Vec<ServiceInfo> {
    let mut seeded: Vec<ServiceInfo> = services
        .iter()
        .map(|service| {
            previous
                .iter()
                .find(|info| &info.service == service)
                .cloned()
                .unwrap_or_else(|| ServiceInfo::new(service.clone()))
        })
        .collect();

    seeded.extend(
        previous
            .into_iter()
            .filter(|info| !services.contains(&info.service)),
    );
    seeded
}

/// 사용자에게 보여줄 비치명적 경고
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub title: String,
    #[serde(default)]
    pub detail: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Warning {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: Vec::new(),
            url: None,
        }
    }

    pub fn with_detail(mut self, line: impl Into<String>) -> Self {
        self.detail.push(line.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_keeps_previous() {
        let mut web = ServiceInfo::new("web");
        web.add_urls(vec!["http://a".to_string(), "http://a".to_string()]);
        let mut orphan = ServiceInfo::new("old");
        orphan.healthy = Some(false);

        let seeded = seed_info(&["web".into(), "db".into()], vec![orphan.clone(), web.clone()]);

        assert_eq!(seeded.len(), 3);
        assert_eq!(seeded[0], web);
        assert_eq!(seeded[0].urls, vec!["http://a"]);
        assert_eq!(seeded[1], ServiceInfo::new("db"));
        assert_eq!(seeded[2], orphan);
    }

    #[test]
    fn test_info_serialization_shape() {
        let mut info = ServiceInfo::new("db");
        info.extra.insert("creds".into(), json!({"user": "root"}));

        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "service": "db",
                "urls": [],
                "type": "docker-compose",
                "healthy": null,
                "creds": {"user": "root"}
            })
        );
    }
}

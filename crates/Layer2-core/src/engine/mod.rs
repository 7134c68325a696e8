//! Engine port - 컨테이너 엔진 인터페이스
//!
//! 애플리케이션과 독립 유닛(공유 프록시) 모두 `EngineTarget`으로 표현됩니다.

use async_trait::async_trait;
use berth_foundation::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Target
// ============================================================================

/// 엔진 작업 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOpts {
    /// destroy 시 볼륨까지 삭제
    pub purge: bool,
}

/// 엔진 작업 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTarget {
    /// compose 프로젝트 이름
    pub project: String,
    /// 디스크립터 파일 (순서 유지)
    pub files: Vec<PathBuf>,
    pub opts: EngineOpts,
}

impl EngineTarget {
    pub fn new(project: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            project: project.into(),
            files,
            opts: EngineOpts::default(),
        }
    }

    pub fn with_purge(mut self, purge: bool) -> Self {
        self.opts.purge = purge;
        self
    }
}

// ============================================================================
// Container
// ============================================================================

/// `list` 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    /// compose 프로젝트
    pub project: String,
    /// compose 서비스
    pub service: String,
}

/// 호스트에 공개된 포트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub host_ip: String,
    pub host_port: u16,
}

/// `scan` 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub id: String,
    pub name: String,
    pub service: String,
    pub running: bool,
    /// `"80/tcp"` 형태의 키
    pub ports: BTreeMap<String, Vec<PortBinding>>,
}

impl ContainerMetadata {
    /// 공개된 80/443 포트로부터 접속 URL 도출
    pub fn urls(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for (key, scheme) in [("80/tcp", "http"), ("443/tcp", "https")] {
            for binding in self.ports.get(key).into_iter().flatten() {
                let url = format!("{}://localhost:{}", scheme, binding.host_port);
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
        urls
    }
}

// ============================================================================
// Engine Trait
// ============================================================================

/// 컨테이너 엔진
///
/// `start`는 이미 실행 중인 대상에 대해 아무 일도 하지 않아야 합니다.
#[async_trait]
pub trait Engine: Send + Sync {
    /// 컨테이너 목록. `project`가 주어지면 해당 프로젝트만
    async fn list(&self, project: Option<&str>) -> Result<Vec<Container>>;

    async fn is_running(&self, id: &str) -> Result<bool>;

    async fn scan(&self, container: &Container) -> Result<ContainerMetadata>;

    async fn start(&self, target: &EngineTarget) -> Result<()>;

    async fn stop(&self, target: &EngineTarget) -> Result<()>;

    async fn destroy(&self, target: &EngineTarget) -> Result<()>;

    async fn build(&self, target: &EngineTarget) -> Result<()>;
}

//! Recording fakes for the engine and scanner ports

use crate::engine::{Container, ContainerMetadata, Engine, EngineTarget};
use crate::scan::{PortScanner, UrlScanner, UrlStatus};
use async_trait::async_trait;
use berth_foundation::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;

// ============================================================================
// RecordingEngine
// ============================================================================

/// 기록된 엔진 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub op: &'static str,
    pub project: String,
    pub files: Vec<PathBuf>,
    pub purge: bool,
}

struct FakeContainer {
    container: Container,
    metadata: ContainerMetadata,
    running: bool,
}

/// 호출을 기록하고 설정된 컨테이너를 돌려주는 엔진
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    containers: Mutex<Vec<FakeContainer>>,
    failures: Mutex<HashSet<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, container: Container, metadata: ContainerMetadata, running: bool) -> Self {
        self.containers.lock().push(FakeContainer {
            container,
            metadata,
            running,
        });
        self
    }

    /// `op` 작업(예: "start")이 실패하도록 설정. `op:project`로 대상 한정 가능
    pub fn fail_on(self, op: &str) -> Self {
        self.failures.lock().insert(op.to_string());
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// `op:project` 형식의 호출 목록
    pub fn ops(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| format!("{}:{}", c.op, c.project))
            .collect()
    }

    fn record(&self, op: &'static str, target: &EngineTarget) -> Result<()> {
        self.calls.lock().push(EngineCall {
            op,
            project: target.project.clone(),
            files: target.files.clone(),
            purge: target.opts.purge,
        });

        let failures = self.failures.lock();
        if failures.contains(op) || failures.contains(&format!("{}:{}", op, target.project)) {
            return Err(Error::engine(op, format!("{} failed", target.project)));
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    async fn list(&self, project: Option<&str>) -> Result<Vec<Container>> {
        Ok(self
            .containers
            .lock()
            .iter()
            .filter(|c| project.map_or(true, |p| c.container.project == p))
            .map(|c| c.container.clone())
            .collect())
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        Ok(self
            .containers
            .lock()
            .iter()
            .any(|c| c.container.id == id && c.running))
    }

    async fn scan(&self, container: &Container) -> Result<ContainerMetadata> {
        self.containers
            .lock()
            .iter()
            .find(|c| c.container.id == container.id)
            .map(|c| c.metadata.clone())
            .ok_or_else(|| Error::engine("scan", format!("no such container: {}", container.id)))
    }

    async fn start(&self, target: &EngineTarget) -> Result<()> {
        self.record("start", target)
    }

    async fn stop(&self, target: &EngineTarget) -> Result<()> {
        self.record("stop", target)
    }

    async fn destroy(&self, target: &EngineTarget) -> Result<()> {
        self.record("destroy", target)
    }

    async fn build(&self, target: &EngineTarget) -> Result<()> {
        self.record("build", target)
    }
}

// ============================================================================
// Scanners
// ============================================================================

/// 지정된 URL만(또는 전부) 살아있다고 답하는 확인기
#[derive(Default)]
pub struct StaticUrlScanner {
    live: Option<HashSet<String>>,
    scanned: Mutex<Vec<(Vec<String>, usize)>>,
}

impl StaticUrlScanner {
    /// 모든 URL이 살아있음
    pub fn all_live() -> Self {
        Self::default()
    }

    pub fn live<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            live: Some(urls.into_iter().map(Into::into).collect()),
            scanned: Mutex::new(Vec::new()),
        }
    }

    /// (요청된 URL, max) 기록
    pub fn scanned(&self) -> Vec<(Vec<String>, usize)> {
        self.scanned.lock().clone()
    }
}

#[async_trait]
impl UrlScanner for StaticUrlScanner {
    async fn scan(&self, urls: &[String], max: usize) -> Vec<UrlStatus> {
        self.scanned.lock().push((urls.to_vec(), max));
        urls.iter()
            .map(|url| UrlStatus {
                url: url.clone(),
                live: self.live.as_ref().map_or(true, |live| live.contains(url)),
            })
            .collect()
    }
}

/// 지정된 포트만 열려 있다고 답하는 탐색기
#[derive(Default)]
pub struct FixedPortScanner {
    open: HashSet<u16>,
    calls: Mutex<Vec<Vec<u16>>>,
}

impl FixedPortScanner {
    pub fn new<I: IntoIterator<Item = u16>>(open: I) -> Self {
        Self {
            open: open.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 요청된 후보 목록들
    pub fn calls(&self) -> Vec<Vec<u16>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PortScanner for FixedPortScanner {
    async fn first_open(&self, candidates: &[u16]) -> Option<u16> {
        self.calls.lock().push(candidates.to_vec());
        candidates.iter().copied().find(|p| self.open.contains(p))
    }
}

//! Docker engine adapter
//!
//! 조회(list/inspect)는 Docker API(bollard)로, 라이프사이클 작업은
//! compose CLI로 처리합니다.

use crate::compose::ComposeCommand;
use async_trait::async_trait;
use berth_core::{Container, ContainerMetadata, Engine, EngineTarget, PortBinding};
use berth_foundation::{Error, Result};
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerInspectResponse, ContainerSummary};
use bollard::Docker;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// compose가 붙이는 프로젝트 라벨
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
/// compose가 붙이는 서비스 라벨
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// 로컬 Docker 데몬 엔진
pub struct DockerEngine {
    docker: Docker,
    compose: ComposeCommand,
}

impl DockerEngine {
    /// 로컬 기본 소켓에 연결하고 compose 실행 파일을 찾습니다
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::engine("connect", e.to_string()))?;
        let compose = ComposeCommand::detect()?;
        debug!(compose = ?compose, "Docker engine ready");
        Ok(Self { docker, compose })
    }

    pub fn with_compose(mut self, compose: ComposeCommand) -> Self {
        self.compose = compose;
        self
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Error::engine("inspect", e.to_string()))
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn list(&self, project: Option<&str>) -> Result<Vec<Container>> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        let label = match project {
            Some(project) => format!("{}={}", COMPOSE_PROJECT_LABEL, project),
            None => COMPOSE_PROJECT_LABEL.to_string(),
        };
        filters.insert("label".to_string(), vec![label]);

        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(|e| Error::engine("list", e.to_string()))?;

        let containers: Vec<Container> = summaries.iter().filter_map(container_from_summary).collect();
        trace!(count = containers.len(), "Listed containers");
        Ok(containers)
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(state_running(&response)),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(false)
            }
            Err(e) => Err(Error::engine("inspect", e.to_string())),
        }
    }

    async fn scan(&self, container: &Container) -> Result<ContainerMetadata> {
        let response = self.inspect(&container.id).await?;
        Ok(metadata_from_inspect(container, &response))
    }

    async fn start(&self, target: &EngineTarget) -> Result<()> {
        self.compose
            .run("start", target, &["up", "-d", "--remove-orphans"])
            .await
            .map(|_| ())
    }

    async fn stop(&self, target: &EngineTarget) -> Result<()> {
        self.compose.run("stop", target, &["stop"]).await.map(|_| ())
    }

    async fn destroy(&self, target: &EngineTarget) -> Result<()> {
        let mut args = vec!["down", "--remove-orphans"];
        if target.opts.purge {
            args.push("--volumes");
        }
        self.compose.run("destroy", target, &args).await.map(|_| ())
    }

    async fn build(&self, target: &EngineTarget) -> Result<()> {
        self.compose.run("build", target, &["build"]).await.map(|_| ())
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn container_from_summary(summary: &ContainerSummary) -> Option<Container> {
    let id = summary.id.clone()?;
    let labels = summary.labels.as_ref()?;
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());

    Some(Container {
        id,
        name,
        project: labels.get(COMPOSE_PROJECT_LABEL).cloned()?,
        service: labels.get(COMPOSE_SERVICE_LABEL).cloned().unwrap_or_default(),
    })
}

fn state_running(response: &ContainerInspectResponse) -> bool {
    response
        .state
        .as_ref()
        .and_then(|s| s.running)
        .unwrap_or(false)
}

fn metadata_from_inspect(container: &Container, response: &ContainerInspectResponse) -> ContainerMetadata {
    let mut ports: BTreeMap<String, Vec<PortBinding>> = BTreeMap::new();
    let port_map = response
        .network_settings
        .as_ref()
        .and_then(|n| n.ports.as_ref());

    for (key, bindings) in port_map.into_iter().flatten() {
        let bindings: Vec<PortBinding> = bindings
            .iter()
            .flatten()
            .filter_map(|b| {
                let host_port = b.host_port.as_deref()?.parse().ok()?;
                Some(PortBinding {
                    host_ip: b.host_ip.clone().unwrap_or_default(),
                    host_port,
                })
            })
            .collect();
        if !bindings.is_empty() {
            ports.insert(key.clone(), bindings);
        }
    }

    let service = response
        .config
        .as_ref()
        .and_then(|c| c.labels.as_ref())
        .and_then(|l| l.get(COMPOSE_SERVICE_LABEL).cloned())
        .unwrap_or_else(|| container.service.clone());

    ContainerMetadata {
        id: container.id.clone(),
        name: container.name.clone(),
        service,
        running: state_running(response),
        ports,
    }
}

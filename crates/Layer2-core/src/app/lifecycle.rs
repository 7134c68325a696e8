//! Lifecycle operations
//!
//! 각 작업은 정해진 단계를 순서대로 실행하며, 엔진 호출이나 훅 핸들러가
//! 실패하면 남은 단계를 건너뛰고 에러를 그대로 반환합니다.

use super::{Application, ServiceInfo};
use crate::scan::live_urls;
use berth_foundation::{app_hooks, Result};
use std::sync::Arc;
use tracing::{debug, trace};

/// 라이프사이클 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Uninitialized,
    Initialized,
    Started,
    Stopped,
    Rebuilding,
    Uninstalled,
    Destroyed,
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Rebuilding => "rebuilding",
            Self::Uninstalled => "uninstalled",
            Self::Destroyed => "destroyed",
        };
        write!(f, "{}", s)
    }
}

impl Application {
    /// 시작
    pub async fn start(&mut self) -> Result<()> {
        self.message(format!("Starting app {}!", self.name));

        self.init().await?;
        self.report("start").await;
        self.emit(app_hooks::PRE_START).await?;

        let engine = Arc::clone(self.runtime.engine());
        engine.start(&self.engine_target()).await?;

        self.emit(app_hooks::POST_START).await?;
        self.inspect().await?;

        let mut urls: Vec<String> = Vec::new();
        for url in self.info.iter().flat_map(|i| i.urls.iter()) {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        let scanner = Arc::clone(self.runtime.url_scanner());
        let statuses = scanner
            .scan(&urls, self.runtime.config().scan_concurrency)
            .await;
        self.urls = live_urls(statuses);

        debug!(app = %self.name, urls = ?self.urls, "App has live urls");
        self.state = AppState::Started;
        Ok(())
    }

    /// 정지
    pub async fn stop(&mut self) -> Result<()> {
        self.message(format!("Stopping {}", self.name));

        self.init().await?;
        self.report("stop").await;
        self.emit(app_hooks::PRE_STOP).await?;

        let engine = Arc::clone(self.runtime.engine());
        engine.stop(&self.engine_target()).await?;

        self.emit(app_hooks::POST_STOP).await?;
        self.state = AppState::Stopped;
        Ok(())
    }

    /// 정지 후 시작 (겹치지 않음)
    pub async fn restart(&mut self) -> Result<()> {
        self.message(format!("Restarting {}", self.name));
        self.stop().await?;
        self.start().await
    }

    /// 컨테이너 제거. `purge`면 볼륨까지 제거
    pub async fn uninstall(&mut self, purge: bool) -> Result<()> {
        self.message(format!("Uninstalling {}", self.name));

        self.report("uninstall").await;
        self.emit(app_hooks::PRE_UNINSTALL).await?;

        let engine = Arc::clone(self.runtime.engine());
        engine
            .destroy(&self.engine_target().with_purge(purge))
            .await?;

        self.emit(app_hooks::POST_UNINSTALL).await?;
        self.state = AppState::Uninstalled;
        Ok(())
    }

    /// 정지 + 볼륨 포함 제거
    pub async fn destroy(&mut self) -> Result<()> {
        self.message(format!("Destroying {}", self.name));

        self.emit(app_hooks::PRE_DESTROY).await?;
        self.stop().await?;
        self.uninstall(true).await?;
        self.emit(app_hooks::POST_DESTROY).await?;

        self.state = AppState::Destroyed;
        Ok(())
    }

    /// 정지 → 제거(볼륨 유지) → 빌드 → 시작
    pub async fn rebuild(&mut self) -> Result<()> {
        self.message(format!("Rebuilding {}", self.name));

        self.stop().await?;
        self.state = AppState::Rebuilding;
        self.emit(app_hooks::PRE_REBUILD).await?;
        self.uninstall(false).await?;

        let engine = Arc::clone(self.runtime.engine());
        engine.build(&self.engine_target()).await?;

        self.emit(app_hooks::POST_REBUILD).await?;
        self.start().await
    }

    /// 서비스 정보 수집
    ///
    /// 실행 중인 컨테이너의 메타데이터에서 URL을 도출해 같은 이름의 서비스
    /// 정보에 병합합니다. 일치하는 서비스가 없으면 버립니다.
    pub async fn inspect(&mut self) -> Result<Vec<ServiceInfo>> {
        self.init().await?;
        self.emit(app_hooks::PRE_INFO).await?;

        self.seed_info();

        let app_name = self.name.clone();
        let engine = Arc::clone(self.runtime.engine());
        for container in engine.list(Some(self.project.as_str())).await? {
            if !engine.is_running(&container.id).await? {
                trace!(container = %container.name, "Skipping stopped container");
                continue;
            }

            let metadata = engine.scan(&container).await?;
            let urls = metadata.urls();
            match self.info_for_mut(&metadata.service) {
                Some(info) => info.add_urls(urls),
                None => debug!(
                    app = %app_name,
                    service = %metadata.service,
                    "Dropping metadata for a service the app does not define"
                ),
            }
        }

        self.emit(app_hooks::POST_INFO).await?;
        Ok(self.info.clone())
    }
}

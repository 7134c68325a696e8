//! berth-core: Core Runtime for Berth
//!
//! Layer2 - 애플리케이션 라이프사이클 레이어
//!
//! # 주요 모듈
//!
//! - `app`: Application 상태 머신 (init / start / stop / rebuild / destroy / inspect)
//! - `compose`: Compose fragment 모델, deep merge, 디스크립터 저장소
//! - `engine`: 컨테이너 엔진 포트
//! - `plugin`: 플러그인 발견 / 앱 확장 로드
//! - `runtime`: 프로세스 전체 협력자 묶음
//! - `scan`: URL 생존 확인 / 열린 포트 탐색
//!
//! # 사용 예시
//!
//! ```ignore
//! use berth_core::{Application, Runtime};
//!
//! let runtime = Runtime::builder(config)
//!     .with_engine(Arc::new(DockerEngine::new()?))
//!     .build()?;
//!
//! let mut app = Application::load("/srv/demo/.berth.yml", runtime)?;
//! app.start().await?;
//!
//! for warning in &app.warnings {
//!     eprintln!("{}", warning.title);
//! }
//! ```

// Core modules
pub mod app;
pub mod compose;
pub mod engine;
pub mod plugin;
pub mod runtime;
pub mod scan;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports: Application
pub use app::{AppConfig, AppState, Application, ServiceInfo, Warning, APP_DESCRIPTOR_FILE};

// Re-exports: Compose
pub use compose::{deep_merge, ComposeFragment, DescriptorStore, YamlStore, COMPOSE_VERSION};

// Re-exports: Engine
pub use engine::{Container, ContainerMetadata, Engine, EngineOpts, EngineTarget, PortBinding};

// Re-exports: Plugin
pub use plugin::{AppExtension, AppUnit, ExtensionData, PluginDescriptor, PluginRegistry};

// Re-exports: Runtime
pub use runtime::{Runtime, RuntimeBuilder};

// Re-exports: Scan
pub use scan::{HttpUrlScanner, PortScanner, TcpPortScanner, UrlScanner, UrlStatus};

//! # berth-proxy
//!
//! 여러 앱이 공유하는 리버스 프록시(traefik) 협상.
//!
//! - `ports`: 호스트 포트 결정 (캐시 비교, 병렬 스캔, 컨테이너 부재 시 재스캔)
//! - `routes`: `proxy:` 설정 → traefik 라벨 / 접속 URL
//! - `unit`: 공유 프록시 유닛 디스크립터와 시작
//! - `extension`: `pre-start` 훅으로 위 단계를 묶는 앱 확장
//!
//! ```ignore
//! let runtime = Runtime::builder(config)
//!     .with_engine(engine)
//!     .with_builtin(Arc::new(ProxyExtension::new()))
//!     .build()?;
//! ```

pub mod extension;
pub mod ports;
pub mod routes;
pub mod unit;

pub use extension::{
    add_proxy_urls, negotiate, ProxyExtension, NEGOTIATION_PRIORITY, PROXY_DOCS_URL,
    PROXY_EDGE_NETWORK, PROXY_EXTENSION, PROXY_URL_OWNER, ROUTING_FRAGMENT_ID,
};
pub use ports::{ensure_resolved, find_proxy_ports, needs_protocol_scan, ProtocolStatus};
pub use routes::{duplicate_urls, parse_config, route_info_urls, url_counts, RouteUrl, ServiceRoute};
pub use unit::{proxy_unit, start_proxy_unit, PROXY_SERVICE, PROXY_UNIT_ID};

//! Proxy extension - 앱의 `pre-start`에 프록시 협상을 연결
//!
//! ## 협상 단계
//!
//! ```text
//! 포트 결정 ─▶ 프록시 유닛 시작 ─▶ (성공 시) 포트 캐시 기록
//!     ─▶ URL 중복 검사 ─▶ 라우팅 overlay fragment 추가
//!     ─▶ post-start / post-init URL 훅 등록
//! ```
//!
//! 어느 단계든 실패하면 앱에 경고를 남기고 `start`는 프록시 없이 계속됩니다.

use crate::ports::{ensure_resolved, find_proxy_ports, needs_protocol_scan};
use crate::routes::{duplicate_urls, parse_config, route_info_urls, ServiceRoute};
use crate::unit::start_proxy_unit;
use async_trait::async_trait;
use berth_core::{AppExtension, Application, ComposeFragment, ExtensionData, Runtime, Warning};
use berth_foundation::{app_hooks, CacheOptions, ProxyPorts, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 확장 이름 (pre-start 훅 소유자)
pub const PROXY_EXTENSION: &str = "proxy";
/// URL 훅 소유자. 확장 재로드와 무관하게 유지됩니다.
pub const PROXY_URL_OWNER: &str = "proxy-urls";
/// 앱 쪽 라우팅 overlay fragment ID
pub const ROUTING_FRAGMENT_ID: &str = "proxy";
/// 앱 compose 안에서 프록시 네트워크를 가리키는 이름
pub const PROXY_EDGE_NETWORK: &str = "berth_proxyedge";
/// 가능한 가장 이른 우선순위
pub const NEGOTIATION_PRIORITY: i32 = 1;
/// 프록시 문서
pub const PROXY_DOCS_URL: &str = "https://docs.berth.dev/config/proxy";

/// 공유 프록시 확장
#[derive(Debug, Default)]
pub struct ProxyExtension;

impl ProxyExtension {
    pub fn new() -> Self {
        Self
    }

    /// 프록시가 켜져 있고 앱이 라우트나 레시피를 선언했을 때만 동작
    pub fn is_active(app: &Application, runtime: &Runtime) -> bool {
        runtime.config().proxy_enabled() && (!app.config.proxy.is_empty() || app.config.recipe.is_some())
    }
}

#[async_trait]
impl AppExtension for ProxyExtension {
    fn name(&self) -> &str {
        PROXY_EXTENSION
    }

    async fn load(&self, app: &mut Application, runtime: &Arc<Runtime>) -> Result<ExtensionData> {
        if !Self::is_active(app, runtime) {
            debug!(app = %app.name(), "Proxy is not needed");
            return Ok(ExtensionData::new());
        }

        app.events().on_owned(
            PROXY_EXTENSION,
            app_hooks::PRE_START,
            NEGOTIATION_PRIORITY,
            |app: &mut Application| {
                Box::pin(async move {
                    if let Err(e) = negotiate(app).await {
                        warn!(app = %app.name(), "Unable to start the proxy: {}", e);
                        app.warnings.push(
                            Warning::new("Unable to start the proxy")
                                .with_detail(e.to_string())
                                .with_detail("The proxy has been disabled for now so you can continue to work.")
                                .with_detail("Resolve the issue above and rebuild this app to re-enable it.")
                                .with_url(PROXY_DOCS_URL),
                        );
                    }
                    Ok(())
                })
            },
        );

        Ok(ExtensionData::new())
    }
}

// ============================================================================
// Negotiation
// ============================================================================

/// 프록시 협상 전체 단계
pub async fn negotiate(app: &mut Application) -> Result<()> {
    let runtime = Arc::clone(app.runtime());
    let config = runtime.config();

    let last: Option<ProxyPorts> = runtime.cache().get_as(&config.proxy_cache);
    let status = needs_protocol_scan(&config.proxy_current_ports(), last.as_ref());
    debug!(app = %app.name(), ?status, ?last, "Negotiating proxy ports");

    let ports = find_proxy_ports(&runtime, status, last).await?;
    let (http, https) = ensure_resolved(&ports, config)?;

    start_proxy_unit(&runtime, http, https).await?;
    runtime.cache().set(
        &config.proxy_cache,
        serde_json::to_value(ProxyPorts::new(http, https))?,
        CacheOptions::persist(),
    )?;

    for url in duplicate_urls(&app.config.proxy) {
        error!(app = %app.name(), "You cannot assign url {} to more than one service!", url);
    }

    let routes = parse_config(&app.config.proxy, &config.proxy_net)?;
    let overlay = routing_overlay(app, &routes, &config.proxy_net);
    let file = app.append_fragment(overlay)?;
    debug!(app = %app.name(), file = %file.display(), "App has proxy compose file");

    register_url_hooks(app);
    Ok(())
}

/// 존재하는 서비스의 라우트만 담은 overlay
fn routing_overlay(app: &Application, routes: &[ServiceRoute], proxy_net: &str) -> ComposeFragment {
    let mut services = Map::new();

    for route in routes {
        if !app.services.contains(&route.service) {
            error!(app = %app.name(), "{} is a service that does not exist in your app!", route.service);
            warn!(app = %app.name(), "Try running `berth info` and using one of the services listed there.");
            continue;
        }
        services.insert(
            route.service.clone(),
            json!({
                "networks": { PROXY_EDGE_NETWORK: {} },
                "labels": route.labels,
            }),
        );
    }

    let data = if services.is_empty() {
        json!({})
    } else {
        json!({
            "services": Value::Object(services),
            "networks": {
                PROXY_EDGE_NETWORK: { "external": { "name": proxy_net } }
            }
        })
    };

    ComposeFragment::new(ROUTING_FRAGMENT_ID, data)
}

/// 캐시된 포트로 라우트 URL을 서비스 정보에 추가하는 훅 등록
fn register_url_hooks(app: &Application) {
    app.events().clear_owner(PROXY_URL_OWNER);

    for hook in [app_hooks::POST_START, app_hooks::POST_INIT] {
        app.events()
            .on_owned(PROXY_URL_OWNER, hook, None, |app: &mut Application| {
                Box::pin(async move {
                    add_proxy_urls(app);
                    Ok(())
                })
            });
    }
}

/// 라우트가 있는 서비스 정보에 프록시 URL 추가 (중복 제거)
pub fn add_proxy_urls(app: &mut Application) {
    let runtime = Arc::clone(app.runtime());
    let Some(ports) = runtime
        .cache()
        .get_as::<ProxyPorts>(&runtime.config().proxy_cache)
    else {
        return;
    };

    app.seed_info();
    let routes = app.config.proxy.clone();
    for info in app.info.iter_mut() {
        if let Some(urls) = routes.get(&info.service) {
            info.add_urls(route_info_urls(urls, &ports));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::testing::{FixedPortScanner, RecordingEngine, StaticUrlScanner};
    use berth_core::AppConfig;
    use berth_foundation::{BerthConfig, MemoryCache, ProxyMode};

    fn app_with(config: BerthConfig, app_config: AppConfig) -> (tempfile::TempDir, Application) {
        let tmp = tempfile::tempdir().unwrap();
        let config = BerthConfig {
            user_conf_root: tmp.path().join("conf"),
            ..config
        };
        let runtime = Runtime::builder(config)
            .with_engine(Arc::new(RecordingEngine::new()))
            .with_cache(Arc::new(MemoryCache::new()))
            .with_port_scanner(Arc::new(FixedPortScanner::new([80, 443])))
            .with_url_scanner(Arc::new(StaticUrlScanner::all_live()))
            .with_plugin_roots(vec![])
            .build()
            .unwrap();
        let app = Application::new(app_config, tmp.path().join(".berth.yml"), runtime);
        (tmp, app)
    }

    #[tokio::test]
    async fn test_inactive_without_routes() {
        let (_tmp, mut app) = app_with(BerthConfig::default(), AppConfig::new("plain"));
        let runtime = Arc::clone(app.runtime());

        ProxyExtension::new().load(&mut app, &runtime).await.unwrap();
        assert_eq!(app.events().handler_count(app_hooks::PRE_START), 0);
    }

    #[tokio::test]
    async fn test_inactive_when_proxy_off() {
        let config = BerthConfig::default().with_proxy(ProxyMode::Off);
        let app_config = AppConfig::new("routed").with_proxy_route("web", vec!["a.berth.site".into()]);
        let (_tmp, mut app) = app_with(config, app_config);
        let runtime = Arc::clone(app.runtime());

        ProxyExtension::new().load(&mut app, &runtime).await.unwrap();
        assert_eq!(app.events().handler_count(app_hooks::PRE_START), 0);
    }

    #[tokio::test]
    async fn test_recipe_activates_proxy() {
        let (_tmp, mut app) = app_with(BerthConfig::default(), AppConfig::new("r").with_recipe("lamp"));
        let runtime = Arc::clone(app.runtime());

        ProxyExtension::new().load(&mut app, &runtime).await.unwrap();
        assert_eq!(app.events().handler_count(app_hooks::PRE_START), 1);
    }

    #[test]
    fn test_overlay_skips_missing_service() {
        let app_config = AppConfig::new("routed")
            .with_proxy_route("web", vec!["a.berth.site".into()])
            .with_proxy_route("ghost", vec!["b.berth.site".into()]);
        let (_tmp, mut app) = app_with(BerthConfig::default(), app_config);
        app.services = vec!["web".into(), "db".into()];

        let routes = parse_config(&app.config.proxy, "berthproxy_edge").unwrap();
        let overlay = routing_overlay(&app, &routes, "berthproxy_edge");

        assert_eq!(overlay.service_names(), vec!["web"]);
        assert_eq!(
            overlay.data["networks"][PROXY_EDGE_NETWORK]["external"]["name"],
            "berthproxy_edge"
        );
        assert_eq!(
            overlay.data["services"]["web"]["labels"]["traefik.0.frontend.rule"],
            "Host:a.berth.site"
        );
    }

    #[test]
    fn test_overlay_without_valid_routes_is_empty() {
        let app_config = AppConfig::new("routed").with_proxy_route("ghost", vec!["b.berth.site".into()]);
        let (_tmp, app) = app_with(BerthConfig::default(), app_config);

        let routes = parse_config(&app.config.proxy, "berthproxy_edge").unwrap();
        let overlay = routing_overlay(&app, &routes, "berthproxy_edge");

        assert!(overlay.service_names().is_empty());
        assert_eq!(overlay.data, json!({}));
    }
}

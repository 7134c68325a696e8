//! Proxy unit - 여러 앱이 공유하는 traefik 컨테이너

use berth_core::{ComposeFragment, EngineTarget, Runtime};
use berth_foundation::{BerthConfig, Result};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// 프록시 유닛 fragment ID (파일명 `proxy.yml`)
pub const PROXY_UNIT_ID: &str = "proxy";
/// 프록시 유닛 서비스 이름
pub const PROXY_SERVICE: &str = "proxy";

/// 프록시 유닛 디스크립터
///
/// compose 프로젝트 이름이 `proxy_name`이므로 `edge` 네트워크는
/// `<proxy_name>_edge`, 컨테이너는 `<proxy_name>_proxy_1`이 됩니다.
pub fn proxy_unit(config: &BerthConfig, http: u16, https: u16) -> ComposeFragment {
    ComposeFragment::new(
        PROXY_UNIT_ID,
        json!({
            "services": {
                PROXY_SERVICE: {
                    "image": config.proxy_image,
                    "command": [
                        "--api",
                        "--docker",
                        format!("--docker.domain={}", config.proxy_domain),
                        "--docker.exposedbydefault=false",
                        "--defaultentrypoints=http,https",
                        "--entrypoints=Name:http Address::80",
                        "--entrypoints=Name:https Address::443 TLS",
                    ],
                    "ports": [format!("{}:80", http), format!("{}:443", https)],
                    "volumes": ["/var/run/docker.sock:/var/run/docker.sock"],
                    "networks": ["edge"],
                    "restart": "always",
                }
            },
            "networks": {
                "edge": {"driver": "bridge"}
            }
        }),
    )
}

/// 프록시 유닛 파일을 쓰고 엔진으로 시작. 이미 실행 중이면 엔진 쪽에서 무시됩니다.
pub async fn start_proxy_unit(runtime: &Runtime, http: u16, https: u16) -> Result<PathBuf> {
    let config = runtime.config();
    let unit = proxy_unit(config, http, https);
    let file = runtime
        .store()
        .dump(&unit.file_path(&config.proxy_dir()), &unit.to_descriptor())?;

    info!(http, https, project = %config.proxy_name, "Starting proxy");
    runtime
        .engine()
        .start(&EngineTarget::new(config.proxy_name.clone(), vec![file.clone()]))
        .await?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_unit_ports() {
        let config = BerthConfig::default();
        let unit = proxy_unit(&config, 8000, 8443);

        assert_eq!(unit.service_names(), vec!["proxy"]);
        assert_eq!(
            unit.data["services"]["proxy"]["ports"],
            json!(["8000:80", "8443:443"])
        );
        assert_eq!(unit.data["services"]["proxy"]["image"], "traefik:1.7");
    }
}

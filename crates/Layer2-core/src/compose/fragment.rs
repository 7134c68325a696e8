//! Compose fragments - 레이어드 서비스 디스크립터의 한 층

use super::merge::deep_merge;
use super::store::DescriptorStore;
use berth_foundation::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 모든 flatten 결과에 기록되는 스키마 버전
pub const COMPOSE_VERSION: &str = "3.2";

/// 전역 env/labels를 담는 fragment ID (항상 맨 앞)
pub const GLOBALS_FRAGMENT_ID: &str = "globals";

/// 선언된 compose 레이어 fragment ID 접두사
pub const DECLARED_FRAGMENT_PREFIX: &str = "compose";

/// 선언된 레이어 하나당 fragment 하나: `compose-<index>`
pub fn declared_fragment_id(index: usize) -> String {
    format!("{}-{}", DECLARED_FRAGMENT_PREFIX, index)
}

// ============================================================================
// ComposeFragment
// ============================================================================

/// 이름이 붙은 서비스 트리 한 층
///
/// `data`는 `services`, `networks`, `volumes` 같은 최상위 섹션을 키로 가집니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFragment {
    pub id: String,
    #[serde(default = "empty_tree")]
    pub data: Value,
}

fn empty_tree() -> Value {
    Value::Object(Map::new())
}

impl ComposeFragment {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// `services` 섹션의 서비스 이름
    pub fn service_names(&self) -> Vec<String> {
        self.data
            .get("services")
            .and_then(Value::as_object)
            .map(|services| services.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// 버전 필드가 붙은 디스크립터
    pub fn to_descriptor(&self) -> Value {
        let mut descriptor = self.data.clone();
        deep_merge(&mut descriptor, json!({ "version": COMPOSE_VERSION }));
        descriptor
    }

    /// `{dir}/{id}.yml`
    pub fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.yml", self.id))
    }
}

// ============================================================================
// Fragment list helpers
// ============================================================================

/// 모든 fragment의 서비스 이름 합집합 (처음 나온 순서 유지, 중복 제거)
pub fn collect_services(fragments: &[ComposeFragment]) -> Vec<String> {
    let mut services: Vec<String> = Vec::new();
    for name in fragments.iter().flat_map(ComposeFragment::service_names) {
        if !services.contains(&name) {
            services.push(name);
        }
    }
    services
}

/// 같은 ID가 있으면 그 fragment에 병합하고, 없으면 뒤에 추가
pub fn upsert_fragment(fragments: &mut Vec<ComposeFragment>, fragment: ComposeFragment) {
    match fragments.iter_mut().find(|f| f.id == fragment.id) {
        Some(existing) => deep_merge(&mut existing.data, fragment.data),
        None => fragments.push(fragment),
    }
}

/// 각 서비스에 전역 env/labels를 주입하는 fragment
pub fn globals_fragment(
    services: &[String],
    env: &BTreeMap<String, String>,
    labels: &BTreeMap<String, String>,
) -> ComposeFragment {
    let services: Map<String, Value> = services
        .iter()
        .map(|name| {
            (
                name.clone(),
                json!({ "environment": env, "labels": labels }),
            )
        })
        .collect();

    ComposeFragment::new(GLOBALS_FRAGMENT_ID, json!({ "services": services }))
}

/// fragment들을 하나씩 파일로 기록하고 경로 목록 반환
pub fn dump_fragments(
    store: &dyn DescriptorStore,
    dir: &Path,
    fragments: &[ComposeFragment],
) -> Result<Vec<PathBuf>> {
    fragments
        .iter()
        .map(|fragment| store.dump(&fragment.file_path(dir), &fragment.to_descriptor()))
        .collect()
}

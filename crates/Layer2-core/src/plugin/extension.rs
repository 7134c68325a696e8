//! App extensions - 애플리케이션에 병합되는 플러그인 결과

use crate::app::Application;
use crate::compose::ComposeFragment;
use crate::runtime::Runtime;
use async_trait::async_trait;
use berth_foundation::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 확장 결과에서 허용되는 키
pub const ALLOWED_KEYS: [&str; 4] = ["config", "composeFragments", "env", "labels"];

// ============================================================================
// ExtensionData
// ============================================================================

/// 플러그인 확장이 애플리케이션에 병합할 수 있는 데이터
///
/// 허용 목록 밖의 키는 경계에서 버려집니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionData {
    /// 앱 설정에 deep merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    /// ID 단위로 병합되는 fragment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compose_fragments: Vec<ComposeFragment>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ExtensionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 임의의 값에서 허용된 키만 추출
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Ok(Self::default());
        };

        let dropped: Vec<String> = map
            .keys()
            .filter(|k| !ALLOWED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in &dropped {
            map.remove(key);
        }
        if !dropped.is_empty() {
            debug!(keys = ?dropped, "Dropping keys outside the extension allow-list");
        }

        for key in ["env", "labels"] {
            if let Some(Value::Object(entries)) = map.get_mut(key) {
                stringify_scalars(entries);
            }
        }

        Ok(serde_json::from_value(Value::Object(map))?)
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_fragment(mut self, fragment: ComposeFragment) -> Self {
        self.compose_fragments.push(fragment);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_none()
            && self.compose_fragments.is_empty()
            && self.env.is_empty()
            && self.labels.is_empty()
    }
}

/// 숫자/불리언 값은 compose처럼 문자열로 취급
fn stringify_scalars(entries: &mut serde_json::Map<String, Value>) {
    for value in entries.values_mut() {
        match value {
            Value::Number(n) => *value = Value::String(n.to_string()),
            Value::Bool(b) => *value = Value::String(b.to_string()),
            _ => {}
        }
    }
}

// ============================================================================
// AppExtension Trait
// ============================================================================

/// 애플리케이션 범위 확장
///
/// `load`는 `init`마다 호출됩니다. 확장이 등록하는 훅은 확장 이름을 소유자로
/// 지정해야 하며(`events().on_owned(self.name(), ..)`), 재로드 전에 일괄 제거됩니다.
#[async_trait]
pub trait AppExtension: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self, app: &mut Application, runtime: &Arc<Runtime>) -> Result<ExtensionData>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_are_dropped() {
        let data = ExtensionData::from_value(json!({
            "env": {"A": "1"},
            "labels": {"io.berth.x": "y"},
            "services": ["evil"],
            "name": "renamed",
            "composeFragments": [{"id": "extra", "data": {"services": {"web": {}}}}]
        }))
        .unwrap();

        assert_eq!(data.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(data.labels.len(), 1);
        assert_eq!(data.compose_fragments.len(), 1);
        assert_eq!(data.compose_fragments[0].id, "extra");
        assert!(data.config.is_none());
    }

    #[test]
    fn test_scalar_env_and_labels_become_strings() {
        let data = ExtensionData::from_value(json!({
            "env": {"PHP_PORT": 9000, "DEBUG": true},
            "labels": {"io.berth.weight": 1.5}
        }))
        .unwrap();

        assert_eq!(data.env.get("PHP_PORT").map(String::as_str), Some("9000"));
        assert_eq!(data.env.get("DEBUG").map(String::as_str), Some("true"));
        assert_eq!(data.labels.get("io.berth.weight").map(String::as_str), Some("1.5"));
    }

    #[test]
    fn test_nested_env_value_is_rejected() {
        assert!(ExtensionData::from_value(json!({"env": {"A": {"nested": 1}}})).is_err());
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(ExtensionData::from_value(json!(["x"])).unwrap().is_empty());
        assert!(ExtensionData::from_value(Value::Null).unwrap().is_empty());
    }
}

//! Application identity helpers

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// 소문자 + 공백을 하이픈으로
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

/// 파일 시스템 / 엔진에서 안전한 프로젝트 이름 (영숫자만)
pub fn project_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// 이름 + 디스크립터 경로의 안정적인 해시
pub fn app_id(name: &str, descriptor: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    format!("{}-{}", name, descriptor.display()).hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

//! Error types for Berth
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Berth 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Descriptor error: {path} - {message}")]
    Descriptor { path: String, message: String },

    // ========================================================================
    // Engine 관련
    // ========================================================================
    #[error("Engine error: {operation} - {message}")]
    Engine { operation: String, message: String },

    // ========================================================================
    // Hook / Plugin 관련
    // ========================================================================
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Plugin extension not found: {0}")]
    PluginNotFound(String),

    // ========================================================================
    // Proxy 관련
    // ========================================================================
    #[error("{0}")]
    Negotiation(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 컴포넌트 경계에서 흡수되어 경고로 전환되는 에러인지 확인
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Negotiation(_))
    }

    /// Engine 에러 생성 헬퍼
    pub fn engine(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Engine {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Hook 에러 생성 헬퍼
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Descriptor 에러 생성 헬퍼
    pub fn descriptor(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        Error::Descriptor {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

//! Hook Names - 라이프사이클 훅 이름 정의
//!
//! 프로세스 범위 훅과 애플리케이션 범위 훅을 구분합니다.

// ============================================================================
// Process-wide
// ============================================================================

/// 프로세스 전체 버스에서 발생하는 훅
pub mod process {
    /// 애플리케이션 인스턴스화 직전 (플러그인 병합 후)
    pub const PRE_INSTANTIATE_APP: &str = "pre-instantiate-app";
}

// ============================================================================
// Application
// ============================================================================

/// 애플리케이션 버스에서 발생하는 훅
pub mod app {
    pub const POST_INSTANTIATE_APP: &str = "post-instantiate-app";
    pub const POST_INIT: &str = "post-init";

    pub const PRE_START: &str = "pre-start";
    pub const POST_START: &str = "post-start";

    pub const PRE_STOP: &str = "pre-stop";
    pub const POST_STOP: &str = "post-stop";

    pub const PRE_UNINSTALL: &str = "pre-uninstall";
    pub const POST_UNINSTALL: &str = "post-uninstall";

    pub const PRE_DESTROY: &str = "pre-destroy";
    pub const POST_DESTROY: &str = "post-destroy";

    pub const PRE_REBUILD: &str = "pre-rebuild";
    pub const POST_REBUILD: &str = "post-rebuild";

    pub const PRE_INFO: &str = "pre-info";
    pub const POST_INFO: &str = "post-info";
}

//! Config - 전역 설정 관리
//!
//! - `global.rs` - BerthConfig (사용자 + 프로젝트 병합)

mod global;

pub use global::{BerthConfig, ProxyMode, ProxyPorts, BERTH_CONFIG_FILE};

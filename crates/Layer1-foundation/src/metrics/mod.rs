//! Telemetry and messaging ports
//!
//! 두 포트 모두 실패해도 라이프사이클 작업을 막지 않습니다.
//! 호출하는 쪽에서 에러를 로그로 남기고 무시합니다.

use crate::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

// ============================================================================
// Metrics
// ============================================================================

/// 텔레메트리 리포터
#[async_trait]
pub trait Metrics: Send + Sync {
    async fn report(&self, event: &str, data: Value) -> Result<()>;
}

/// `tracing`으로 이벤트를 남기는 리포터
#[derive(Debug, Default)]
pub struct LogMetrics;

impl LogMetrics {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Metrics for LogMetrics {
    async fn report(&self, event: &str, data: Value) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        info!(target: "berth::metrics", event, %timestamp, data = %data, "report");
        Ok(())
    }
}

// ============================================================================
// Messenger
// ============================================================================

/// 사용자에게 보여주는 진행 메시지 출력
pub trait Messenger: Send + Sync {
    fn message(&self, text: &str) -> Result<()>;
}

/// 표준 에러로 출력
#[derive(Debug, Default)]
pub struct StderrMessenger;

impl Messenger for StderrMessenger {
    fn message(&self, text: &str) -> Result<()> {
        use std::io::Write;
        let mut err = std::io::stderr().lock();
        writeln!(err, "{}", text)?;
        Ok(())
    }
}

/// 메시지를 메모리에 모아두는 구현 (테스트, 비대화형 실행용)
#[derive(Debug, Default)]
pub struct BufferMessenger {
    lines: Mutex<Vec<String>>,
}

impl BufferMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Messenger for BufferMessenger {
    fn message(&self, text: &str) -> Result<()> {
        self.lines.lock().push(text.to_string());
        Ok(())
    }
}

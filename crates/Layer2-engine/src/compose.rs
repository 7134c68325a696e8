//! docker compose command runner

use berth_core::EngineTarget;
use berth_foundation::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// compose 실행 방식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeCommand {
    /// `docker compose` (CLI 플러그인)
    Plugin(PathBuf),
    /// `docker-compose` (독립 실행 파일)
    Standalone(PathBuf),
}

/// 실행 결과
#[derive(Debug, Clone)]
pub struct ComposeOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ComposeCommand {
    /// PATH에서 docker / docker-compose 탐색
    pub fn detect() -> Result<Self> {
        if let Ok(docker) = which::which("docker") {
            return Ok(ComposeCommand::Plugin(docker));
        }
        if let Ok(compose) = which::which("docker-compose") {
            return Ok(ComposeCommand::Standalone(compose));
        }
        Err(Error::engine(
            "detect",
            "could not find docker or docker-compose on PATH",
        ))
    }

    fn program(&self) -> &PathBuf {
        match self {
            ComposeCommand::Plugin(path) | ComposeCommand::Standalone(path) => path,
        }
    }

    /// 전체 인자 목록
    pub fn args(&self, target: &EngineTarget, subcommand: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if matches!(self, ComposeCommand::Plugin(_)) {
            args.push("compose".to_string());
        }
        args.push("--project-name".to_string());
        args.push(target.project.clone());
        for file in &target.files {
            args.push("--file".to_string());
            args.push(file.display().to_string());
        }
        args.extend(subcommand.iter().map(|s| s.to_string()));
        args
    }

    /// compose 실행. 0이 아닌 종료 코드는 stderr를 담은 엔진 에러가 됩니다.
    pub async fn run(
        &self,
        operation: &str,
        target: &EngineTarget,
        subcommand: &[&str],
    ) -> Result<ComposeOutput> {
        let args = self.args(target, subcommand);
        info!(project = %target.project, operation, "Running compose");
        debug!("{} {}", self.program().display(), args.join(" "));

        let output = tokio::process::Command::new(self.program())
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::engine(operation, e.to_string()))?;

        let result = ComposeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            Err(Error::engine(
                operation,
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    result.stderr.trim()
                ),
            ))
        }
    }
}

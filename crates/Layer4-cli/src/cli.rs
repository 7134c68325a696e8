//! Lifecycle command execution and output

use crate::Command;
use berth_core::{Application, ServiceInfo, Warning};

/// 명령 실행 후 결과 출력
pub async fn execute(app: &mut Application, command: &Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Start => {
            app.start().await?;
            print_warnings(&app.warnings);
            println!("{}", render_info(&app.info, json)?);
            if !json {
                println!("{}", render_urls(&app.urls));
            }
        }
        Command::Stop => {
            app.stop().await?;
            print_warnings(&app.warnings);
        }
        Command::Restart => {
            app.restart().await?;
            print_warnings(&app.warnings);
            println!("{}", render_info(&app.info, json)?);
        }
        Command::Rebuild => {
            app.rebuild().await?;
            print_warnings(&app.warnings);
            println!("{}", render_info(&app.info, json)?);
        }
        Command::Destroy => {
            app.destroy().await?;
            print_warnings(&app.warnings);
        }
        Command::Info => {
            let info = app.inspect().await?;
            print_warnings(&app.warnings);
            println!("{}", render_info(&info, json)?);
        }
    }
    Ok(())
}

fn print_warnings(warnings: &[Warning]) {
    if !warnings.is_empty() {
        eprintln!("{}", render_warnings(warnings));
    }
}

/// 경고 목록
pub fn render_warnings(warnings: &[Warning]) -> String {
    let mut out = String::new();
    for warning in warnings {
        out.push_str(&format!("⚠ {}\n", warning.title));
        for line in &warning.detail {
            out.push_str(&format!("    {}\n", line));
        }
        if let Some(url) = &warning.url {
            out.push_str(&format!("    see: {}\n", url));
        }
    }
    out.trim_end().to_string()
}

/// 서비스 정보. `json`이면 pretty JSON
pub fn render_info(info: &[ServiceInfo], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(info)?);
    }

    let mut out = String::new();
    for service in info {
        out.push_str(&format!("{:<16} {}\n", service.service, service.kind));
        if service.urls.is_empty() {
            out.push_str("    (no urls)\n");
        }
        for url in &service.urls {
            out.push_str(&format!("    {}\n", url));
        }
    }
    Ok(out.trim_end().to_string())
}

fn render_urls(urls: &[String]) -> String {
    if urls.is_empty() {
        return "No reachable urls yet.".to_string();
    }
    let mut out = String::from("Reachable urls:\n");
    for url in urls {
        out.push_str(&format!("  ✓ {}\n", url));
    }
    out.trim_end().to_string()
}

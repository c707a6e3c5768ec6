use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::cli::{utils, OutputFormat};
use crate::config::{self, AppConfig};

pub async fn handle(url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = url.unwrap_or_else(|| default_base_url(config::config()));
    let health_url = format!("{}/health", base.trim_end_matches('/'));

    let client = reqwest::Client::new();
    let started = Instant::now();
    let response = match client.get(&health_url).timeout(Duration::from_secs(5)).send().await {
        Ok(response) => response,
        Err(e) => {
            utils::output_error(output_format, &format!("{} unreachable: {}", base, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        utils::output_success(
            output_format,
            &format!("{} is up ({} ms)", base, elapsed_ms),
            Some(json!({ "url": base, "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )
    } else {
        utils::output_error(
            output_format,
            &format!("{} responded with {}", base, status),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server unhealthy")
    }
}

/// Local address for the configured port; `0.0.0.0` is not dialable.
fn default_base_url(config: &AppConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    format!("http://{}:{}", host, config.server.port)
}

//! `GET <health_check_path>` response body.

use relaygate_provider_core::{Config, LoadBalance};
use serde_json::{json, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn load_balance_str(load_balance: LoadBalance) -> &'static str {
    match load_balance {
        LoadBalance::Sequential => "sequential",
        LoadBalance::RoundRobin => "round_robin",
    }
}

/// Builds the health-check JSON body from the current config snapshot and
/// the number of whole seconds the process has been running.
pub fn build_health_body(config: &Config, uptime_seconds: u64) -> Value {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    json!({
        "status": "ok",
        "timestamp": timestamp,
        "uptime_seconds": uptime_seconds,
        "upstream_count": config.upstreams.len(),
        "current_upstream": config.current_upstream,
        "load_balance": load_balance_str(config.load_balance),
    })
}

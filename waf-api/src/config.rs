//! Server configuration: environment variables with `clap`-flag overrides,
//! following the teacher's `router-api::main` (`--ip`/`--port`, env
//! fallback) and `router-core::config` (typed config keys).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "waf-api", version, about = "Multi-tenant WAF control plane and evaluation API")]
pub struct Cli {
    /// IP address to bind the server to.
    #[arg(long, default_value = "0.0.0.0")]
    pub ip: String,

    /// Port number to bind the server to.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Directory holding one SQLite database per tenant.
    #[arg(long, env = "WAF_DATA_DIR", default_value = "/tmp/wafrs/data")]
    pub data_dir: PathBuf,

    /// Default request deadline, in milliseconds, applied when a caller
    /// does not supply one to `/api/v1/ingress/evaluate`.
    #[arg(long, env = "WAF_DEADLINE_MS", default_value_t = 2_000)]
    pub deadline_ms: u64,

    /// Capacity of the decision-event channel (C9).
    #[arg(long, env = "WAF_EVENT_CHANNEL_CAPACITY", default_value_t = 4_096)]
    pub event_channel_capacity: usize,
}

impl Cli {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn default_deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

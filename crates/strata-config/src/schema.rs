//! Configuration sections.

use serde::{Deserialize, Serialize};

/// The `[general]` section: transport and response policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_ip")]
    pub listen_ip: String,

    /// Port to listen on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// `Server` header value, usually `name/version`.
    #[serde(default)]
    pub server_ident: Option<String>,

    /// Origin allowed to make cross-origin requests.
    #[serde(default)]
    pub cross_origin_domains: Option<String>,

    /// Send `Cache-Control: no-cache` and `Pragma: no-cache`.
    #[serde(default = "default_true")]
    pub inhibit_http_caching: bool,

    /// Take the client address from `X-Real-IP`.
    #[serde(default = "default_true")]
    pub honor_x_real_ip: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            listen_ip: default_listen_ip(),
            listen_port: default_listen_port(),
            server_ident: None,
            cross_origin_domains: None,
            inhibit_http_caching: true,
            honor_x_real_ip: true,
        }
    }
}

fn default_listen_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    9990
}

fn default_true() -> bool {
    true
}

/// The `[metrics]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Prefix prepended to every counter name.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Install the Prometheus exporter.
    #[serde(default)]
    pub prometheus: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, multi-line output.
    Pretty,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Name recorded on every log line, like a syslog tag.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            prefix: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

//! Assembling a site from configuration and API modules.

use std::path::Path;
use std::sync::Arc;

use strata_config::{ConfigLoader, LogFormat, StrataConfig};
use strata_core::MetricsSink;
use strata_router::{ApiModule, ApiRouter};
use strata_server::{Dispatcher, Server, ServerConfig, Site};
use strata_telemetry::{CounterMetrics, LogConfig, PrometheusHandle};

use crate::{AppError, Result};

/// Prefix of environment overrides, e.g. `STRATA__GENERAL__LISTEN_PORT`.
pub const ENV_PREFIX: &str = "STRATA";

/// A site: configuration plus the API modules it serves.
///
/// APIs listed under `[apis]` are routed first, in configuration order,
/// under their configured prefix pattern. Registered modules the
/// configuration does not mention follow, in registration order, under
/// their lower-cased name.
#[derive(Debug)]
pub struct App {
    config: StrataConfig,
    modules: Vec<ApiModule>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl App {
    /// Creates a site from an already loaded configuration.
    #[must_use]
    pub fn new(config: StrataConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
            metrics: None,
        }
    }

    /// Loads the configuration file at `path`, applies `STRATA__*`
    /// overrides and validates the result.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = ConfigLoader::new()
            .with_file(path)?
            .with_env_prefix(ENV_PREFIX)
            .load()?;
        Ok(Self::new(config))
    }

    /// Registers an API module.
    #[must_use]
    pub fn api(mut self, module: ApiModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Replaces the counter sink built from `[metrics]`.
    #[must_use]
    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Builds the API router.
    pub fn router(&self) -> Result<ApiRouter> {
        let mut builder = ApiRouter::builder()
            .inhibit_http_caching(self.config.general.inhibit_http_caching)
            .metrics(self.metrics_sink());

        if let Some(origin) = &self.config.general.cross_origin_domains {
            builder = builder.cross_origin_domains(origin.clone());
        }

        for (name, pattern) in &self.config.apis {
            let module = self
                .module(name)
                .ok_or_else(|| AppError::UnknownModule(name.clone()))?;
            builder = builder.route(pattern.clone(), module.clone());
        }

        for module in &self.modules {
            let configured = self
                .config
                .apis
                .keys()
                .any(|name| name.eq_ignore_ascii_case(module.name()));
            if !configured {
                builder = builder.route(module.name().to_lowercase(), module.clone());
            }
        }

        for (name, settings) in &self.config.api_config {
            builder = builder.config(name.clone(), settings.clone());
        }

        Ok(builder.build()?)
    }

    /// Builds the dispatcher: router plus site settings.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        let general = &self.config.general;
        let site = Site::new(general.server_ident.as_deref(), general.honor_x_real_ip)?;
        Ok(Dispatcher::new(self.router()?).with_site(site))
    }

    /// Builds the server bound to `[general]`'s address.
    pub fn server(&self) -> Result<Server> {
        let general = &self.config.general;
        let config = ServerConfig::builder()
            .listen(&general.listen_ip, general.listen_port)
            .build();
        Ok(Server::new(config, self.dispatcher()?))
    }

    /// Installs logging and, when `[metrics] prometheus` is set, the
    /// Prometheus recorder.
    pub fn init_telemetry(&self) -> Result<Option<PrometheusHandle>> {
        strata_telemetry::init_logging(&self.log_config())?;
        if self.config.metrics.prometheus {
            Ok(Some(strata_telemetry::init_prometheus()?))
        } else {
            Ok(None)
        }
    }

    /// Installs telemetry and serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<()> {
        self.init_telemetry()?;
        let server = self.server()?;
        tracing::info!(
            addr = %server.config().listen_addr(),
            apis = self.modules.len(),
            "starting site"
        );
        server.run().await?;
        tracing::info!("site stopped");
        Ok(())
    }

    fn module(&self, name: &str) -> Option<&ApiModule> {
        self.modules
            .iter()
            .find(|module| module.name().eq_ignore_ascii_case(name))
    }

    fn metrics_sink(&self) -> Arc<dyn MetricsSink> {
        match &self.metrics {
            Some(sink) => Arc::clone(sink),
            None => {
                let sink = match &self.config.metrics.prefix {
                    Some(prefix) => CounterMetrics::with_prefix(prefix.clone()),
                    None => CounterMetrics::new(),
                };
                Arc::new(sink)
            }
        }
    }

    fn log_config(&self) -> LogConfig {
        let logging = &self.config.logging;
        LogConfig {
            level: logging.level.clone(),
            json_format: logging.format == LogFormat::Json,
            prefix: logging.prefix.clone(),
            ..LogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::ConfigLoader;

    fn config(toml: &str) -> StrataConfig {
        ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap()
    }

    #[test]
    fn test_configured_prefix_used() {
        let app = App::new(config("[apis]\ndemo = \"(demo|dmo)\"")).api(crate::demo::api().unwrap());
        let router = app.router().unwrap();
        let routes: Vec<_> = router.route_map().map(|(pattern, _)| pattern.to_string()).collect();
        assert_eq!(routes, ["(demo|dmo)"]);
    }

    #[test]
    fn test_unconfigured_module_uses_name() {
        let app = App::new(StrataConfig::default()).api(crate::demo::api().unwrap());
        let router = app.router().unwrap();
        let routes: Vec<_> = router.route_map().map(|(pattern, _)| pattern.to_string()).collect();
        assert_eq!(routes, ["demo"]);
    }

    #[test]
    fn test_unknown_configured_api() {
        let app = App::new(config("[apis]\nbilling = \"billing\""));
        assert!(matches!(app.router(), Err(AppError::UnknownModule(name)) if name == "billing"));
    }

    #[test]
    fn test_bad_server_ident() {
        let app = App::new(config("[general]\nserver_ident = \"bad\\nident\""));
        assert!(matches!(app.dispatcher(), Err(AppError::Server(_))));
    }

    #[test]
    fn test_log_config_mapping() {
        let app = App::new(config(
            "[logging]\nlevel = \"debug\"\nformat = \"pretty\"\nprefix = \"demo\"",
        ));
        let log = app.log_config();
        assert_eq!(log.level, "debug");
        assert!(!log.json_format);
        assert_eq!(log.prefix.as_deref(), Some("demo"));
    }

    #[test]
    fn test_server_listen_addr() {
        let app = App::new(config("[general]\nlisten_ip = \"0.0.0.0\"\nlisten_port = 8181"));
        let server = app.server().unwrap();
        assert_eq!(server.config().listen_addr(), "0.0.0.0:8181");
    }
}

//! The root configuration structure.

use std::net::IpAddr;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ConfigError, GeneralConfig, LoggingConfig, MetricsConfig};

/// Complete configuration for a Strata site.
///
/// Every section is optional in the source; missing sections take their
/// defaults.
///
/// # Example
///
/// ```
/// use strata_config::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.general.listen_port, 9990);
/// assert!(config.apis.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Transport and response policy.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Counter naming and export.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API name to URL prefix pattern, in matching order.
    #[serde(default)]
    pub apis: IndexMap<String, String>,

    /// Per-API settings handed to handlers, keyed by API name.
    #[serde(default)]
    pub api_config: IndexMap<String, Map<String, Value>>,
}

impl StrataConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the listen address is not an
    /// IP address, the port is zero, or an API prefix pattern does not
    /// compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.listen_ip.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "general.listen_ip",
                format!("not an IP address: {}", self.general.listen_ip),
            ));
        }

        if self.general.listen_port == 0 {
            return Err(ConfigError::invalid_value(
                "general.listen_port",
                "must be non-zero",
            ));
        }

        for (name, pattern) in &self.apis {
            if let Err(e) = Regex::new(pattern) {
                return Err(ConfigError::invalid_value(format!("apis.{name}"), e.to_string()));
            }
        }

        Ok(())
    }

    /// Returns the settings configured for `api`, if any.
    ///
    /// Lookup is case-insensitive on the API name.
    #[must_use]
    pub fn api_settings(&self, api: &str) -> Option<&Map<String, Value>> {
        self.api_config
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(api))
            .map(|(_, settings)| settings)
    }
}

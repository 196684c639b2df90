use serde::Deserialize;
use std::convert::TryFrom;

/// Startup configuration for the bridge.
///
/// The only required setting is `handler`, the dotted
/// `"module.attribute"` path resolved against the process's
/// [`Registry`](crate::Registry). A process that starts without a
/// configured handler must not serve requests, so a missing value is a
/// startup error, never defaulted.
///
/// Values can come from a `gatelink.toml` file or from environment
/// variables with the `GATELINK_` prefix; the environment wins.
#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    /// Dotted path of the handler to serve, e.g. `"hello.ping_app"`.
    pub handler: String,
}

/// Implements conversion from the config crate's Config type to BridgeConfig.
impl TryFrom<config::Config> for BridgeConfig {
    type Error = config::ConfigError;

    fn try_from(config: config::Config) -> Result<Self, Self::Error> {
        config.try_deserialize()
    }
}

impl BridgeConfig {
    /// Load configuration from the environment and the optional config
    /// file.
    ///
    /// This method will:
    /// 1. Load environment variables from a .env file if present
    /// 2. Load configuration from a "gatelink" file (if it exists)
    /// 3. Override with environment variables prefixed with "GATELINK_"
    ///
    /// # Errors
    /// Returns a ConfigError if loading fails or no handler is configured.
    pub fn new() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("gatelink").required(false))
            .add_source(config::Environment::with_prefix("GATELINK"));

        builder.build()?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Tests configuration loading from environment variables.
    /// Verifies that BridgeConfig correctly reads the handler path from
    /// variables with the "GATELINK_" prefix.
    #[test]
    fn test_config_from_env() {
        env::set_var("GATELINK_HANDLER", "hello.ping_app");

        let config = BridgeConfig::new().unwrap();
        assert_eq!(config.handler, "hello.ping_app");

        // Cleanup
        env::remove_var("GATELINK_HANDLER");
    }

    /// Tests that a configuration without a handler path fails to load
    /// instead of defaulting.
    #[test]
    fn test_missing_handler_is_fatal() {
        let empty = config::Config::builder().build().unwrap();
        assert!(BridgeConfig::try_from(empty).is_err());
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use slotscan_core::{config::ScannerConfig, watchers::WatcherKind};
use slotscan_logger::LogConfig;

/// Prefix of environment variables that override file settings,
/// e.g. `SLOTSCAN__SCANNER__SCAN__PAGE_LIMIT=400` for `scanner.scan.page-limit`.
pub const ENV_PREFIX: &str = "SLOTSCAN";

/// The top-level configuration for the slotscan daemon.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DaemonConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub daemon: DaemonSettings,
}

/// Contains settings that are unique to the daemon binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DaemonSettings {
    /// Watchers to run, each at most once.
    pub watchers: Vec<WatcherKind>,
    pub log: LogConfig,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            watchers: WatcherKind::ALL.to_vec(),
            log: LogConfig::default(),
        }
    }
}

/// Loads the daemon configuration from a TOML file, then applies
/// `SLOTSCAN__*` environment overrides.
pub fn load_config(path: &str) -> Result<DaemonConfig> {
    load_config_with_env(path, None)
}

/// Like [`load_config`], reading overrides from `env` instead of the process
/// environment when it is given.
pub fn load_config_with_env(
    path: &str,
    env: Option<config::Map<String, String>>,
) -> Result<DaemonConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Kebab)
                .try_parsing(true)
                .source(env),
        );

    let settings: DaemonConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    settings
        .scanner
        .validate()
        .context("Invalid scanner configuration")?;
    Ok(settings)
}

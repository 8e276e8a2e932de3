//! Configuration and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use drillkit_core::engine::PracticeEngineConfig;
use drillkit_core::model::Difficulty;
use drillkit_core::parser;
use drillkit_core::traits::QuestionProvider;

use crate::fixture::FixtureProvider;
use crate::remote::{RemoteProvider, DEFAULT_TIMEOUT_SECS};
use crate::template::TemplateProvider;

/// Name of the always-available template provider.
pub const TEMPLATE_PROVIDER: &str = "template";

/// Configuration for a single question provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Serve questions from a TOML bank file or directory.
    Fixture { bank: PathBuf },
    /// Randomized built-in templates.
    Template {
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default)]
        delay_ms: u64,
    },
    /// HTTP endpoint speaking the remote question protocol.
    Remote {
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Fixture { bank } => {
                f.debug_struct("Fixture").field("bank", bank).finish()
            }
            ProviderConfig::Template { seed, delay_ms } => f
                .debug_struct("Template")
                .field("seed", seed)
                .field("delay_ms", delay_ms)
                .finish(),
            ProviderConfig::Remote {
                endpoint,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Remote")
                .field("endpoint", endpoint)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

fn default_template() -> ProviderConfig {
    ProviderConfig::Template {
        seed: None,
        delay_ms: 0,
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level drillkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillkitConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when none is named on the command line.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Parsed leniently; unknown values fall back to medium.
    #[serde(default = "default_difficulty")]
    pub default_difficulty: String,
    /// Questions per practice session.
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Artificial delay for the upload parser, in milliseconds.
    #[serde(default)]
    pub simulated_delay_ms: u64,
    /// Where persisted slots live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_provider() -> String {
    TEMPLATE_PROVIDER.to_string()
}
fn default_category() -> String {
    drillkit_core::traits::DEFAULT_CATEGORY.to_string()
}
fn default_difficulty() -> String {
    "medium".to_string()
}
fn default_count() -> usize {
    5
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./drillkit-data")
}

impl Default for DrillkitConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::from([(TEMPLATE_PROVIDER.to_string(), default_template())]),
            default_provider: default_provider(),
            default_category: default_category(),
            default_difficulty: default_difficulty(),
            default_count: default_count(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            simulated_delay_ms: 0,
            data_dir: default_data_dir(),
        }
    }
}

impl DrillkitConfig {
    /// Retry settings for the practice engine.
    pub fn engine_config(&self) -> PracticeEngineConfig {
        PracticeEngineConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::parse_or_default(&self.default_difficulty)
    }

    /// Look up a provider by name, or the default provider.
    pub fn provider(&self, name: Option<&str>) -> Result<(&str, &ProviderConfig)> {
        let name = name.unwrap_or(&self.default_provider);
        self.providers
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| {
                let mut known: Vec<_> = self.providers.keys().map(String::as_str).collect();
                known.sort_unstable();
                format!("unknown provider '{name}' (configured: {})", known.join(", "))
            })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Fixture { bank } => ProviderConfig::Fixture {
            bank: PathBuf::from(resolve_env_vars(&bank.to_string_lossy())),
        },
        ProviderConfig::Template { .. } => config.clone(),
        ProviderConfig::Remote {
            endpoint,
            api_key,
            timeout_secs,
        } => ProviderConfig::Remote {
            endpoint: resolve_env_vars(endpoint),
            api_key: api_key.as_ref().map(|k| resolve_env_vars(k)),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `drillkit.toml` in the current directory
/// 2. `~/.config/drillkit/config.toml`
///
/// `DRILLKIT_REMOTE_KEY` overrides the API key of the `remote` provider.
pub fn load_config() -> Result<DrillkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<DrillkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("drillkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<DrillkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => DrillkitConfig::default(),
    };

    if let Ok(key) = std::env::var("DRILLKIT_REMOTE_KEY") {
        if let Some(ProviderConfig::Remote { api_key, .. }) = config.providers.get_mut("remote") {
            *api_key = Some(key);
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    config
        .providers
        .entry(TEMPLATE_PROVIDER.into())
        .or_insert_with(default_template);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("drillkit"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn QuestionProvider>> {
    match config {
        ProviderConfig::Fixture { bank } => {
            let bank = parser::load_banks(bank)
                .with_context(|| format!("failed to load bank for provider '{name}'"))?;
            Ok(Box::new(FixtureProvider::from_bank(bank)))
        }
        ProviderConfig::Template { seed, delay_ms } => {
            let provider = match seed {
                Some(seed) => TemplateProvider::with_seed(*seed),
                None => TemplateProvider::new(),
            };
            Ok(Box::new(
                provider.with_delay(Duration::from_millis(*delay_ms)),
            ))
        }
        ProviderConfig::Remote {
            endpoint,
            api_key,
            timeout_secs,
        } => Ok(Box::new(
            RemoteProvider::new(endpoint, api_key.clone(), *timeout_secs)
                .with_context(|| format!("failed to build provider '{name}'"))?,
        )),
    }
}

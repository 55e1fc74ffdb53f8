use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "query-assist.toml";

/// Environment variable prefix, nested keys are separated by `__`
pub const ENV_PREFIX: &str = "QUERY_ASSIST__";

/// Connection settings for the Tempo tag search API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TempoConfig {
    /// Base URL of the Tempo HTTP API
    pub url: String,
    /// Request timeout for tag searches
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// When disabled, completions degrade to "no suggestions" for tag names and values
    pub enabled: bool,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:3200"),
            timeout: Duration::from_secs(30),
            enabled: true,
        }
    }
}

/// Parameters forwarded to every tag search issued by the completion retriever
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Maximum number of tag names or values returned per search
    pub limit: Option<u32>,
    /// Stop collecting values after this many values were seen without a new one
    pub max_stale_values: Option<u32>,
    /// Relative time range searched for tags, ending now
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            limit: None,
            max_stale_values: None,
            lookback: Duration::from_secs(60 * 60),
        }
    }
}

/// Output settings for serialized PromQL
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct FormatConfig {
    /// Render with newlines and two-space indentation
    pub pretty: bool,
    /// Columns of indentation in front of every pretty-printed line
    pub indent: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Tempo tag search backend
    pub tempo: TempoConfig,
    /// Tag search parameters for completions
    pub completion: CompletionSettings,
    /// PromQL formatting defaults
    pub format: FormatConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
            .extract()
            .map_err(Box::new)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path)).extract().map_err(Box::new)
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check invariants figment cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tempo.enabled {
            if self.tempo.url.is_empty() {
                anyhow::bail!("Tempo URL cannot be empty when Tempo is enabled");
            }
            url::Url::parse(&self.tempo.url)
                .map_err(|e| anyhow::anyhow!("Invalid Tempo URL '{}': {e}", self.tempo.url))?;
        }

        if self.completion.lookback.is_zero() {
            anyhow::bail!("Completion lookback must be greater than zero");
        }

        Ok(())
    }
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_USER: &str = "local";
const DEFAULT_BACKUP_PREFIX: &str = "koleks";
const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;
/// Browser-like agent used for raw page scraping. Some platforms serve an
/// empty shell (or a block page) to anything that does not look like Chrome.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_UNFURL_ENDPOINT: &str = "https://api.unfurl.dev/v1/preview";

/// Outbound fetch policy for metadata scraping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Hosts that are never fetched, regardless of scheme.
    #[serde(default)]
    pub blocked_hosts: Vec<String>,

    /// Refuse to fetch hosts resolving to loopback/private ranges.
    #[serde(default = "default_true")]
    pub block_private_ips: bool,

    #[serde(default = "default_scrape_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: default_allowed_schemes(),
            blocked_hosts: Vec::new(),
            block_private_ips: true,
            timeout_secs: DEFAULT_SCRAPE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Third-party unfurl aggregator used for the oEmbed-preferring resolver.
/// An API key, when required, is read from the UNFURL_API_KEY env var.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnfurlConfig {
    #[serde(default = "default_unfurl_endpoint")]
    pub endpoint: String,

    /// Ask the aggregator for compressed thumbnail variants.
    #[serde(default = "default_true")]
    pub compress_images: bool,
}

impl Default for UnfurlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UNFURL_ENDPOINT.to_string(),
            compress_images: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Owner scope for every record this instance reads and writes.
    #[serde(default = "default_user")]
    pub user: String,

    /// Prefix for exported backup file names.
    #[serde(default = "default_backup_prefix")]
    pub backup_prefix: String,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub unfurl: UnfurlConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            backup_prefix: default_backup_prefix(),
            scrape: ScrapeConfig::default(),
            unfurl: UnfurlConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_backup_prefix() -> String {
    DEFAULT_BACKUP_PREFIX.to_string()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_scrape_timeout_secs() -> u64 {
    DEFAULT_SCRAPE_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_unfurl_endpoint() -> String {
    DEFAULT_UNFURL_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.user.trim().is_empty() {
            anyhow::bail!("user must not be empty");
        }

        if self.backup_prefix.trim().is_empty() {
            anyhow::bail!("backup_prefix must not be empty");
        }

        if self.scrape.allowed_schemes.is_empty() {
            anyhow::bail!("scrape.allowed_schemes must list at least one scheme");
        }

        if self.scrape.timeout_secs == 0 {
            anyhow::bail!("scrape.timeout_secs must be greater than 0");
        }

        reqwest::Url::parse(&self.unfurl.endpoint)
            .with_context(|| format!("unfurl.endpoint is not a valid url: {}", self.unfurl.endpoint))?;

        Ok(())
    }

    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("couldn't create {}", base_path.display()))?;

        let config_path = base_path.join("config.yaml");

        // create new if does not exist
        if std::fs::metadata(&config_path).is_err() {
            log::info!("creating default config at {}", config_path.display());
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default())
                    .context("couldn't serialize default config")?,
            )?;
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("couldn't read {}", config_path.display()))?;
        let mut config: Self =
            serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).context("couldn't serialize config")? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = self.base_path.join("config.yaml");
        let config_str = serde_yml::to_string(&self).context("couldn't serialize config")?;
        std::fs::write(&config_path, config_str)
            .with_context(|| format!("couldn't write {}", config_path.display()))?;
        Ok(())
    }
}

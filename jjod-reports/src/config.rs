//! Runtime configuration loaded from `config.toml`.
//!
//! Every setting has a built-in default, so the binary runs without a
//! config file. A file only needs the keys it wants to override:
//!
//! ```toml
//! api_url = "https://ethbe.api.jsearch.io"
//! token_address = "0x94157579d1853d85d90447c4c3217dc63799ab08"
//! confirmation_depth = 6
//! max_attempts = 10
//! retry_delay_secs = 3
//! request_timeout_secs = 30
//! output_dir = "."
//! timezone = "local"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use jsearch::{Client, DEFAULT_API_URL, Endpoints, RetryPolicy};
use serde::Deserialize;

use crate::report::Output;
use crate::units::Zone;

/// Token whose transfers and holders are reported.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x94157579d1853d85d90447c4c3217dc63799ab08";

/// Blocks subtracted from the tip before reporting.
pub const DEFAULT_CONFIRMATION_DEPTH: u64 = 6;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// API origin, without a path.
    pub api_url: String,
    /// Token contract address.
    pub token_address: String,
    /// Reports are taken at `latest - confirmation_depth`.
    pub confirmation_depth: u64,
    /// Attempts per HTTP request.
    pub max_attempts: u32,
    /// Fixed pause between attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Timeout of a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Directory the CSV files are written to.
    pub output_dir: PathBuf,
    /// Zone used for file names and row dates.
    pub timezone: Zone,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token_address: DEFAULT_TOKEN_ADDRESS.to_owned(),
            confirmation_depth: DEFAULT_CONFIRMATION_DEPTH,
            max_attempts: RetryPolicy::DEFAULT_ATTEMPTS,
            retry_delay_secs: RetryPolicy::DEFAULT_DELAY.as_secs(),
            request_timeout_secs: 30,
            output_dir: PathBuf::from("."),
            timezone: Zone::Local,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns [`Config::default`] if the file does not exist,
    /// allowing the binary to work without any config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Retry behaviour for API requests.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    /// Build an API client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn client(&self) -> Result<Client> {
        Client::new(
            Endpoints::new(self.api_url.as_str()),
            self.retry_policy(),
            Duration::from_secs(self.request_timeout_secs),
        )
        .context("building API client")
    }

    /// Where and how report files are written.
    #[must_use]
    pub fn output(&self) -> Output {
        Output {
            dir: self.output_dir.clone(),
            zone: self.timezone,
        }
    }
}

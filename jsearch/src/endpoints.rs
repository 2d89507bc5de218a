//! URL construction for the jsearch REST endpoints.

use std::fmt;
use std::str::FromStr;

/// Public jsearch API origin.
pub const DEFAULT_API_URL: &str = "https://ethbe.api.jsearch.io";

/// Identifies a block: by height, by hash, or the chain tip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockTag {
    /// The most recent block known to the indexer.
    Latest,
    /// Block height.
    Number(u64),
    /// Block hash (`0x`-prefixed hex).
    Hash(String),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Hash(h) => f.write_str(h),
        }
    }
}

/// Error returned when a string is not a valid [`BlockTag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block tag {0:?}: expected a block number, a 0x-prefixed hash or `latest`")]
pub struct ParseBlockTagError(String);

impl FromStr for BlockTag {
    type Err = ParseBlockTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        if let Ok(n) = s.parse::<u64>() {
            return Ok(Self::Number(n));
        }
        match s.strip_prefix("0x") {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Ok(Self::Hash(s.to_owned()))
            }
            _ => Err(ParseBlockTagError(s.to_owned())),
        }
    }
}

/// Builds request URLs against a single API origin.
///
/// Collection endpoints always request descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl Endpoints {
    /// Create endpoints rooted at `base` (e.g. `https://ethbe.api.jsearch.io`).
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    /// The API origin, without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `GET /v1/blocks/{tag}`.
    #[must_use]
    pub fn block(&self, tag: &BlockTag) -> String {
        format!("{}/v1/blocks/{tag}", self.base)
    }

    /// First page of `GET /v1/tokens/{token}/transfers` up to `block_number`.
    #[must_use]
    pub fn transfers(&self, token: &str, block_number: u64) -> String {
        format!(
            "{}/v1/tokens/{token}/transfers?order=desc&block_number={block_number}",
            self.base
        )
    }

    /// First page of `GET /v1/tokens/{token}/holders` at `block_hash`.
    #[must_use]
    pub fn holders(&self, token: &str, block_hash: &str) -> String {
        format!(
            "{}/v1/tokens/{token}/holders?blockchain_tip={block_hash}&order=desc",
            self.base
        )
    }

    /// Resolve a server-supplied `paging.next` link against the origin.
    ///
    /// Links are normally origin-relative paths; absolute URLs pass through.
    #[must_use]
    pub fn next(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            return link.to_owned();
        }
        if link.starts_with('/') {
            format!("{}{link}", self.base)
        } else {
            format!("{}/{link}", self.base)
        }
    }
}

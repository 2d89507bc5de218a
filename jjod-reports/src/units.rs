//! Token unit scaling and timestamp rendering.

use alloy::primitives::U256;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local};
use serde::Deserialize;

/// Decimals of the reported token.
pub const TOKEN_DECIMALS: usize = 18;

/// `10^TOKEN_DECIMALS`.
const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Row timestamp layout, e.g. `2023-11-14 22:13:20`.
pub const ROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File-name timestamp layout, e.g. `2023-11-14-22-13`.
pub const FILE_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Convert a raw integer token amount into whole-token decimal notation.
///
/// The division is exact. Trailing zeros are dropped but at least one
/// fractional digit is kept, so `2000000000000000000` becomes `2.0`.
///
/// # Errors
///
/// Returns an error if `raw` is not a non-negative base-10 integer that
/// fits in 256 bits.
pub fn scale_amount(raw: &str) -> Result<String> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid token amount {raw:?}");
    }
    let value = U256::from_str_radix(digits, 10)
        .map_err(|e| anyhow!("invalid token amount {raw:?}: {e}"))?;

    let whole = value / SCALE;
    let frac = format!("{:0>width$}", (value % SCALE).to_string(), width = TOKEN_DECIMALS);
    let frac = frac.trim_end_matches('0');
    Ok(format!("{whole}.{}", if frac.is_empty() { "0" } else { frac }))
}

/// Time zone used to render block and transfer timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// The host's local time zone.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
}

impl Zone {
    /// Render unix seconds with a `strftime`-style layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp is outside chrono's range.
    pub fn format(self, unix: u64, layout: &str) -> Result<String> {
        let utc = i64::try_from(unix)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .with_context(|| format!("timestamp {unix} out of range"))?;
        Ok(match self {
            Self::Local => utc.with_timezone(&Local).format(layout).to_string(),
            Self::Utc => utc.format(layout).to_string(),
        })
    }
}

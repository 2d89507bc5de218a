//! Response payloads of the jsearch API.
//!
//! Every endpoint wraps its payload in a `data` field; collection
//! endpoints add a `paging` object whose `next` link points at the
//! following page.

use serde::{Deserialize, Deserializer};

/// Deserialize a `u64` from either a JSON number or a JSON string.
fn deserialize_u64_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(u64),
        Str(String),
    }
    match StringOrNum::deserialize(deserializer)? {
        StringOrNum::Num(n) => Ok(n),
        StringOrNum::Str(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

/// Deserialize an integer amount kept verbatim as its decimal string.
///
/// The API sends token amounts as strings because they overflow `u64`,
/// but small values occasionally arrive as plain numbers.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(u64),
        Str(String),
    }
    match StringOrNum::deserialize(deserializer)? {
        StringOrNum::Num(n) => Ok(n.to_string()),
        StringOrNum::Str(s) => Ok(s),
    }
}

/// Top-level `{ "data": ... }` wrapper of single-object responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: Option<T>,
}

/// Block metadata as returned by `/v1/blocks/{tag}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Block {
    /// Block height.
    #[serde(deserialize_with = "deserialize_u64_or_string")]
    pub number: u64,
    /// Block hash (`0x`-prefixed hex).
    pub hash: String,
    /// Block time in unix seconds.
    #[serde(deserialize_with = "deserialize_u64_or_string")]
    pub timestamp: u64,
}

/// A single token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenTransfer {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Raw amount in the token's smallest unit.
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: String,
    /// Time of the containing block in unix seconds.
    #[serde(deserialize_with = "deserialize_u64_or_string")]
    pub timestamp: u64,
    /// Hash of the transaction that emitted the transfer.
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
}

/// A token holder and its balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHolder {
    /// Holder address.
    #[serde(rename = "accountAddress")]
    pub account_address: String,
    /// Raw balance in the token's smallest unit.
    #[serde(deserialize_with = "deserialize_amount")]
    pub balance: String,
}

/// Pagination links of a collection page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Paging {
    /// Relative URL of the next page, `null` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of a paginated collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Records of this page, in server order.
    pub data: Option<Vec<T>>,
    /// Pagination links.
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> Page<T> {
    /// The relative `next` link, if another page follows.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.paging.as_ref().and_then(|p| p.next.as_deref())
    }
}

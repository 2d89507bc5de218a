//! HTTP access to the jsearch API with bounded retry.
//!
//! Every request goes through [`Client::fetch`], which retries failed
//! attempts after a fixed delay. On top of it sit the block resolver and
//! the paginated collection reader.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoints::{BlockTag, Endpoints};
use crate::error::{Error, Result};
use crate::types::{Block, Envelope, Page, TokenHolder, TokenTransfer};

/// How often and how patiently a request is retried.
///
/// The delay is fixed: there is no backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts per request.
    pub const DEFAULT_ATTEMPTS: u32 = 10;
    /// Default pause between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

/// A paginated collection endpoint.
///
/// Implementors only decide where the first page lives and what a record
/// looks like; cursor handling is shared by [`Client::read_page`].
pub trait Collection {
    /// Record type of the page's `data` array.
    type Record: DeserializeOwned;

    /// URL of the first page.
    fn first_page(&self, endpoints: &Endpoints) -> String;
}

/// Transfers of `token` up to and including `block_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfers {
    /// Token contract address.
    pub token: String,
    /// Upper block bound.
    pub block_number: u64,
}

impl Collection for Transfers {
    type Record = TokenTransfer;

    fn first_page(&self, endpoints: &Endpoints) -> String {
        endpoints.transfers(&self.token, self.block_number)
    }
}

/// Holders of `token` as of the block `block_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holders {
    /// Token contract address.
    pub token: String,
    /// Hash of the block balances are taken at.
    pub block_hash: String,
}

impl Collection for Holders {
    type Record = TokenHolder;

    fn first_page(&self, endpoints: &Endpoints) -> String {
        endpoints.holders(&self.token, &self.block_hash)
    }
}

/// Result of reading one page of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRead<T> {
    /// `true` iff the page carried a non-null `paging.next` link.
    pub has_more: bool,
    /// Absolute URL of the next page, present iff `has_more`.
    pub next_url: Option<String>,
    /// Records of this page, in server order.
    pub records: Vec<T>,
}

/// jsearch API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Endpoints,
    retry: RetryPolicy,
}

impl Client {
    /// Create a client whose individual requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] if the TLS backend cannot be initialised.
    pub fn new(endpoints: Endpoints, retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Builder)?;
        Ok(Self {
            http,
            endpoints,
            retry,
        })
    }

    /// The endpoints this client talks to.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET `url` and parse the body as JSON, retrying failed attempts.
    ///
    /// An attempt fails on transport errors, non-2xx statuses and bodies
    /// that are not JSON. No schema is checked here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once every attempt has failed.
    pub async fn fetch(&self, url: &str) -> Result<Value> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.get_json(url).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    tracing::warn!(url, attempt, max_attempts = attempts, error = %e.chain(), "request failed, retrying");
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(url, attempts, error = %e.chain(), "request failed, giving up");
                    return Err(Error::RetriesExhausted {
                        url: url.to_owned(),
                        attempts,
                        last: Box::new(e),
                    });
                }
            }
        }
    }

    /// A single attempt.
    async fn get_json(&self, url: &str) -> Result<Value> {
        let http = |source| Error::Http {
            url: url.to_owned(),
            source,
        };
        self.http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http)?
            .json::<Value>()
            .await
            .map_err(http)
    }

    /// Resolve a block tag to its number, hash and timestamp.
    ///
    /// # Errors
    ///
    /// Fails if the request fails, or the response has no `data` object.
    pub async fn resolve_block(&self, tag: &BlockTag) -> Result<Block> {
        let url = self.endpoints.block(tag);
        let envelope: Envelope<Block> = decode(&url, self.fetch(&url).await?)?;
        envelope
            .data
            .ok_or(Error::MissingField { url, field: "data" })
    }

    /// Read one page of `collection`.
    ///
    /// With `cursor == None` the first page is requested; otherwise
    /// `cursor` must be a `next_url` returned by a previous call.
    ///
    /// # Errors
    ///
    /// Fails if the request fails, the payload does not match the record
    /// type, or the page has no `data` array.
    pub async fn read_page<C: Collection>(
        &self,
        collection: &C,
        cursor: Option<&str>,
    ) -> Result<PageRead<C::Record>> {
        let url = cursor.map_or_else(|| collection.first_page(&self.endpoints), str::to_owned);
        let page: Page<C::Record> = decode(&url, self.fetch(&url).await?)?;

        let next_url = page.next().map(|link| self.endpoints.next(link));
        let Some(records) = page.data else {
            return Err(Error::MissingField { url, field: "data" });
        };

        tracing::debug!(url = %url, records = records.len(), has_more = next_url.is_some(), "page read");
        Ok(PageRead {
            has_more: next_url.is_some(),
            next_url,
            records,
        })
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| Error::Decode {
        url: url.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn client(server: &Server, max_attempts: u32) -> Client {
        client_with_delay(server, max_attempts, Duration::ZERO)
    }

    fn client_with_delay(server: &Server, max_attempts: u32, delay: Duration) -> Client {
        Client::new(
            Endpoints::new(server.url()),
            RetryPolicy {
                max_attempts,
                delay,
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    const BLOCK_100: &str =
        r#"{"data":{"number":100,"hash":"0xabc","timestamp":1700000000,"miner":"0x0"}}"#;

    #[tokio::test]
    async fn resolves_latest_block() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BLOCK_100)
            .expect(1)
            .create_async()
            .await;

        let block = client(&server, 3)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap();
        assert_eq!(block.number, 100);
        assert_eq!(block.hash, "0xabc");
        assert_eq!(block.timestamp, 1_700_000_000);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn block_without_data_is_an_error_and_not_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/94")
            .with_status(200)
            .with_body(r#"{"error":"not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server, 5)
            .resolve_block(&BlockTag::Number(94))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "data", .. }));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn failing_requests_are_attempted_exactly_max_attempts_times() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(502)
            .expect(4)
            .create_async()
            .await;

        let err = client(&server, 4)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap_err();
        match err {
            Error::RetriesExhausted { attempts, last, .. } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, Error::Http { .. }));
                assert_eq!(last.chain().matches("request to").count(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        m.assert_async().await;
    }

    #[tokio::test]
    async fn recovers_after_failed_attempts() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;
        let healthy = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(200)
            .with_body(BLOCK_100)
            .expect(1)
            .create_async()
            .await;

        let block = client(&server, 10)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap();
        assert_eq!(block.number, 100);
        failing.assert_async().await;
        healthy.assert_async().await;
    }

    #[tokio::test]
    async fn waits_the_fixed_delay_between_attempts() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let delay = Duration::from_millis(150);
        let started = std::time::Instant::now();
        let err = client_with_delay(&server, 3, delay)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert!(started.elapsed() >= delay * 2);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_json_counts_as_a_failed_attempt() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(200)
            .with_body("<html>busy</html>")
            .expect(2)
            .create_async()
            .await;

        let err = client(&server, 2)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/blocks/latest")
            .with_status(200)
            .with_body(BLOCK_100)
            .expect(1)
            .create_async()
            .await;

        client(&server, 0)
            .resolve_block(&BlockTag::Latest)
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn follows_next_link_until_it_is_null() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/v1/tokens/0xt/holders")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("blockchain_tip".into(), "0xabc".into()),
                Matcher::UrlEncoded("order".into(), "desc".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":[{"accountAddress":"0x1","balance":"1"}],
                    "paging":{"next":"/v1/tokens/0xt/holders?cursor=x"}}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v1/tokens/0xt/holders")
            .match_query(Matcher::UrlEncoded("cursor".into(), "x".into()))
            .with_status(200)
            .with_body(r#"{"data":[{"accountAddress":"0x2","balance":"2"}],"paging":{"next":null}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server, 1);
        let holders = Holders {
            token: "0xt".into(),
            block_hash: "0xabc".into(),
        };

        let page = client.read_page(&holders, None).await.unwrap();
        assert!(page.has_more);
        assert_eq!(
            page.next_url.as_deref(),
            Some(format!("{}/v1/tokens/0xt/holders?cursor=x", server.url()).as_str())
        );
        assert_eq!(page.records[0].account_address, "0x1");

        let page = client
            .read_page(&holders, page.next_url.as_deref())
            .await
            .unwrap();
        assert!(!page.has_more);
        assert_eq!(page.next_url, None);
        assert_eq!(page.records[0].account_address, "0x2");

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn transfers_first_page_is_bounded_by_block_number() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/v1/tokens/0xt/transfers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("order".into(), "desc".into()),
                Matcher::UrlEncoded("block_number".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":[{"from":"0x1","to":"0x2","amount":"2000000000000000000",
                    "timestamp":1700000000,"transactionHash":"0xdead"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let transfers = Transfers {
            token: "0xt".into(),
            block_number: 100,
        };
        let page = client(&server, 1).read_page(&transfers, None).await.unwrap();
        assert!(!page.has_more);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].transaction_hash, "0xdead");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn page_without_data_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tokens/0xt/holders")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"paging":{"next":null}}"#)
            .create_async()
            .await;

        let holders = Holders {
            token: "0xt".into(),
            block_hash: "0xabc".into(),
        };
        let err = client(&server, 1).read_page(&holders, None).await.unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "data", .. }));
    }
}

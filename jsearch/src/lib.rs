//! Client for the jsearch blockchain-indexing REST API.
//!
//! Covers the three endpoints needed to report on an ERC-20 token at a
//! fixed block height:
//!
//! - `GET /v1/blocks/{tag}` resolves a block by number, hash or `latest`.
//! - `GET /v1/tokens/{address}/transfers` lists transfers up to a block.
//! - `GET /v1/tokens/{address}/holders` lists balances at a block hash.
//!
//! Collections are paginated with a server-supplied relative `next`
//! link; [`Client::read_page`] walks one page at a time.

mod client;
mod endpoints;
mod error;
pub mod types;

pub use client::{Client, Collection, Holders, PageRead, RetryPolicy, Transfers};
pub use endpoints::{BlockTag, DEFAULT_API_URL, Endpoints, ParseBlockTagError};
pub use error::{Error, Result};
pub use types::{Block, Page, Paging, TokenHolder, TokenTransfer};

//! End-to-end report run for one confirmed block.
//!
//! 1. Resolve the chain tip and step back `confirmation_depth` blocks
//!    (or resolve an explicit tag instead).
//! 2. Write the transfer report up to that block's number.
//! 3. Write the holder report at that block's hash.
//!
//! A failed report does not stop the other one; the run fails at the end
//! if any report failed.

use anyhow::{Context, Result, bail};
use jsearch::{Block, BlockTag, Client};

use crate::config::Config;
use crate::report::{HolderReport, TransferReport, write_report};

/// Resolve the block to report on.
///
/// With `tag == None` this is `latest - depth`.
///
/// # Errors
///
/// Returns an error if a block cannot be resolved or the chain is
/// shorter than `depth`.
pub async fn target_block(client: &Client, depth: u64, tag: Option<&BlockTag>) -> Result<Block> {
    if let Some(tag) = tag {
        return client
            .resolve_block(tag)
            .await
            .with_context(|| format!("resolving block {tag}"));
    }

    let latest = client
        .resolve_block(&BlockTag::Latest)
        .await
        .context("resolving latest block")?;
    let number = latest.number.checked_sub(depth).with_context(|| {
        format!(
            "latest block {} is below confirmation depth {depth}",
            latest.number
        )
    })?;
    client
        .resolve_block(&BlockTag::Number(number))
        .await
        .with_context(|| format!("resolving block {number}"))
}

/// Generate both reports.
///
/// # Errors
///
/// Returns an error if the target block cannot be resolved or any report
/// failed.
pub async fn run(config: &Config, tag: Option<&BlockTag>) -> Result<()> {
    tracing::info!("Start...");

    let client = config.client()?;
    let block = target_block(&client, config.confirmation_depth, tag).await?;
    tracing::info!(
        number = block.number,
        hash = %block.hash,
        timestamp = block.timestamp,
        "target block"
    );

    let output = config.output();
    let mut failed = 0u32;

    tracing::info!("write_table_1");
    let transfers = TransferReport::new(config.token_address.as_str(), block.number);
    if let Err(e) = write_report(&client, &transfers, block.timestamp, &output).await {
        failed += 1;
        let error = format!("{e:#}");
        tracing::error!(report = "transfers", %error, "report failed");
    }

    tracing::info!("write_table_2");
    let holders = HolderReport::new(config.token_address.as_str(), block.hash.as_str());
    if let Err(e) = write_report(&client, &holders, block.timestamp, &output).await {
        failed += 1;
        let error = format!("{e:#}");
        tracing::error!(report = "holders", %error, "report failed");
    }

    tracing::info!("Finish");

    if failed > 0 {
        bail!("{failed} report(s) failed");
    }
    Ok(())
}

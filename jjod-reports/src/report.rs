//! CSV report generation over paginated API collections.
//!
//! A report walks its collection page by page and writes one row per
//! record. Rows go to `<name>.csv.tmp`, which is renamed to `<name>.csv`
//! only after the last page; a failed report leaves no file behind.
//!
//! Every row, header included, ends with a trailing comma.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsearch::{Client, Collection, Holders, TokenHolder, TokenTransfer, Transfers};

use crate::units::{FILE_TIME_FORMAT, ROW_TIME_FORMAT, Zone, scale_amount};

/// Record type of a report's source collection.
pub type RecordOf<R> = <<R as Report>::Source as Collection>::Record;

/// A CSV report fed by one paginated collection.
pub trait Report {
    /// Collection the rows come from.
    type Source: Collection;

    /// Short name used in logs.
    const NAME: &'static str;

    /// File name prefix; the block time and `.csv` are appended.
    const FILE_PREFIX: &'static str;

    /// Column titles.
    const HEADER: &'static [&'static str];

    /// The collection to walk.
    fn source(&self) -> &Self::Source;

    /// Render one record as CSV fields, in [`Report::HEADER`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be rendered.
    fn row(&self, record: &RecordOf<Self>, zone: Zone) -> Result<Vec<String>>;
}

/// Transfers of the token up to the target block.
#[derive(Debug, Clone)]
pub struct TransferReport {
    source: Transfers,
}

impl TransferReport {
    /// Report on `token` transfers up to `block_number`.
    #[must_use]
    pub fn new(token: impl Into<String>, block_number: u64) -> Self {
        Self {
            source: Transfers {
                token: token.into(),
                block_number,
            },
        }
    }
}

impl Report for TransferReport {
    type Source = Transfers;

    const NAME: &'static str = "transfers";
    const FILE_PREFIX: &'static str = "jjood-transfers";
    const HEADER: &'static [&'static str] = &["From", "To", "Amount", "Date", "TX hash"];

    fn source(&self) -> &Transfers {
        &self.source
    }

    fn row(&self, t: &TokenTransfer, zone: Zone) -> Result<Vec<String>> {
        Ok(vec![
            t.from.clone(),
            t.to.clone(),
            scale_amount(&t.amount).with_context(|| format!("transfer {}", t.transaction_hash))?,
            zone.format(t.timestamp, ROW_TIME_FORMAT)?,
            t.transaction_hash.clone(),
        ])
    }
}

/// Token balances at the target block.
#[derive(Debug, Clone)]
pub struct HolderReport {
    source: Holders,
}

impl HolderReport {
    /// Report on `token` holders at `block_hash`.
    #[must_use]
    pub fn new(token: impl Into<String>, block_hash: impl Into<String>) -> Self {
        Self {
            source: Holders {
                token: token.into(),
                block_hash: block_hash.into(),
            },
        }
    }
}

impl Report for HolderReport {
    type Source = Holders;

    const NAME: &'static str = "holders";
    const FILE_PREFIX: &'static str = "jjod-holders";
    const HEADER: &'static [&'static str] = &["address", "balance"];

    fn source(&self) -> &Holders {
        &self.source
    }

    fn row(&self, h: &TokenHolder, _zone: Zone) -> Result<Vec<String>> {
        Ok(vec![
            h.account_address.clone(),
            scale_amount(&h.balance).with_context(|| format!("holder {}", h.account_address))?,
        ])
    }
}

/// Where report files go and which zone names them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Target directory, created if missing.
    pub dir: PathBuf,
    /// Zone for file-name stamps and row dates.
    pub zone: Zone,
}

/// File name of report `R` for a block at `block_timestamp`.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be rendered.
pub fn file_name<R: Report>(block_timestamp: u64, zone: Zone) -> Result<String> {
    Ok(format!(
        "{}-{}.csv",
        R::FILE_PREFIX,
        zone.format(block_timestamp, FILE_TIME_FORMAT)?
    ))
}

/// Walk `report`'s collection to the end and write it as CSV.
///
/// An existing file of the same name is replaced. Returns the path written.
///
/// # Errors
///
/// Returns an error if a page cannot be fetched, a row cannot be
/// rendered, or the file cannot be written. The partial file is removed.
pub async fn write_report<R>(
    client: &Client,
    report: &R,
    block_timestamp: u64,
    output: &Output,
) -> Result<PathBuf>
where
    R: Report,
    RecordOf<R>: Debug,
{
    std::fs::create_dir_all(&output.dir)
        .with_context(|| format!("creating {}", output.dir.display()))?;

    let path = output.dir.join(file_name::<R>(block_timestamp, output.zone)?);
    let tmp = path.with_extension("csv.tmp");

    tracing::info!(report = R::NAME, path = %path.display(), "writing report");

    match write_rows(client, report, &tmp, output.zone).await {
        Ok(rows) => {
            std::fs::rename(&tmp, &path)
                .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
            tracing::info!(report = R::NAME, rows, path = %path.display(), "report written");
            Ok(path)
        }
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(&tmp)
                && rm.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %tmp.display(), error = %rm, "could not remove partial report");
            }
            Err(e)
        }
    }
}

/// Write header and rows to `tmp`, returning the number of data rows.
async fn write_rows<R>(client: &Client, report: &R, tmp: &Path, zone: Zone) -> Result<u64>
where
    R: Report,
    RecordOf<R>: Debug,
{
    let mut writer =
        csv::Writer::from_path(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    writer.write_record(R::HEADER.iter().copied().chain([""]))?;

    let mut cursor: Option<String> = None;
    let mut pages = 0u64;
    let mut rows = 0u64;

    loop {
        let page = client
            .read_page(report.source(), cursor.as_deref())
            .await
            .with_context(|| format!("reading {} page {}", R::NAME, pages + 1))?;
        pages += 1;

        for record in &page.records {
            tracing::info!(report = R::NAME, ?record);
            let mut fields = report.row(record, zone)?;
            fields.push(String::new());
            writer.write_record(&fields)?;
            rows += 1;
        }

        if !page.has_more {
            break;
        }
        cursor = page.next_url;
    }

    writer
        .flush()
        .with_context(|| format!("flushing {}", tmp.display()))?;
    tracing::debug!(report = R::NAME, pages, rows, "collection exhausted");
    Ok(rows)
}

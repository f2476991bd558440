//! Shared helpers for command handlers.

use futures_util::TryStreamExt;
use serde_json::Value;

use cpg_api::{Page, Pages, Timestamp};

use crate::error::CliError;

/// Drain a page stream into one flat list of records.
pub async fn collect_items(pages: Pages<'_>) -> Result<Vec<Value>, CliError> {
    let pages: Vec<Page> = pages.try_collect().await?;
    Ok(pages.into_iter().flat_map(Page::into_items).collect())
}

/// A `--since`/`--until` argument: epoch milliseconds when all digits,
/// otherwise `yyyy-MM-dd HH:MM:SS`.
pub fn parse_time(arg: Option<String>) -> Option<Timestamp> {
    arg.map(|text| match text.trim().parse::<i64>() {
        Ok(ms) => Timestamp::EpochMillis(ms),
        Err(_) => Timestamp::Text(text),
    })
}

//! Bulk fetch of every remote page.

use futures::future::try_join_all;

use crate::error::{Result, UserdeckError};
use crate::remote::DirectoryClient;

use super::LocalCache;

/// Upper bound on the page count a server may report.
pub const MAX_PAGES: u32 = 1_000;

/// Fetch page 1 to learn the page count, then the remaining pages concurrently.
///
/// Records are concatenated in page order and then in-page order, whatever
/// order the responses arrive in. The first failing page aborts the whole
/// load: the outstanding fetches are dropped and their results never read.
/// A reported page count above [`MAX_PAGES`] is rejected before any further
/// page is requested.
pub async fn fetch_all_pages<C>(client: &C) -> Result<LocalCache>
where
    C: DirectoryClient + ?Sized,
{
    let first = client.fetch_page(1).await?;
    let total_pages = first.total_pages.max(1);
    if total_pages > MAX_PAGES {
        tracing::warn!(total_pages, "rejecting implausible page count");
        return Err(UserdeckError::Api {
            status: 200,
            message: format!("server reported {total_pages} pages, limit is {MAX_PAGES}"),
        });
    }

    tracing::debug!(total_pages, "fetching remaining directory pages");

    let rest = try_join_all((2..=total_pages).map(|page| client.fetch_page(page))).await?;

    let records = std::iter::once(first)
        .chain(rest)
        .flat_map(|page| page.data)
        .collect::<Vec<_>>();

    Ok(LocalCache::from_records(records))
}

//! Bounded pagination over GitHub list endpoints.
//!
//! Pages are fetched strictly in ascending order because a later page's
//! existence depends on the declared length of earlier ones. The page cap
//! keeps a single dashboard request's latency bounded; for very large
//! repositories the result is deliberately incomplete.

use std::future::Future;

/// Hard ceiling on pages fetched per request (1,000 items at 100 per page).
pub const MAX_PAGES: u32 = 10;

/// Standard page size for uncapped listing endpoints.
pub const PER_PAGE: usize = 100;

/// Fetch pages 1..=`max_pages` and concatenate the items.
///
/// Stops on the first empty page, the first short page (fewer than
/// `per_page` items), or when the cap is reached — whichever comes first.
/// Partial pages are always included in the result.
pub async fn fetch_all_pages<T, E, F, Fut>(
    per_page: usize,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut items = Vec::new();

    for page in 1..=max_pages {
        let batch = fetch_page(page).await?;
        if batch.is_empty() {
            break;
        }
        let batch_len = batch.len();
        items.extend(batch);
        if batch_len < per_page {
            break;
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn concatenates_until_short_page() {
        let calls = AtomicU32::new(0);

        // Three full pages of 3 followed by a page of 2.
        let result: Vec<u32> = fetch_all_pages(3, MAX_PAGES, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let len = if page <= 3 { 3 } else { 2 };
                Ok::<_, ()>((0..len).map(|i| page * 10 + i).collect())
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.len(), 3 * 3 + 2);
        // Strictly ascending page order.
        assert_eq!(result[0], 10);
        assert_eq!(*result.last().unwrap(), 41);
    }

    #[tokio::test]
    async fn halts_at_page_cap_when_pages_never_shorten() {
        let calls = AtomicU32::new(0);

        let result: Vec<u32> = fetch_all_pages(2, MAX_PAGES, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ()>(vec![page, page]) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_PAGES);
        assert_eq!(result.len(), MAX_PAGES as usize * 2);
    }

    #[tokio::test]
    async fn empty_first_page_yields_empty_result() {
        let result: Vec<u32> = fetch_all_pages(100, MAX_PAGES, |_| async { Ok::<_, ()>(vec![]) })
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn error_aborts_the_loop() {
        let calls = AtomicU32::new(0);

        let result: Result<Vec<u32>, &str> = fetch_all_pages(1, MAX_PAGES, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if page == 2 {
                    Err("boom")
                } else {
                    Ok(vec![page])
                }
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

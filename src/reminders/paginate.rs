use std::collections::HashSet;
use std::future::Future;

use tracing::warn;

use crate::platform::{Page, PlatformError};

/// A listing that failed part-way. `items` holds everything gathered from
/// the pages fetched before `error`.
#[derive(Debug, thiserror::Error)]
#[error("listing stopped after {pages} page(s): {error}")]
pub struct PartialPages<T: std::fmt::Debug> {
    pub items: Vec<T>,
    pub pages: usize,
    #[source]
    pub error: PlatformError,
}

impl<T: std::fmt::Debug> PartialPages<T> {
    /// Keep what was gathered, logging the failure against `what`
    pub fn salvage(self, what: &str) -> Vec<T> {
        warn!(
            "Listing {} failed after {} page(s) ({}), continuing with {} item(s)",
            what,
            self.pages,
            self.error.code(),
            self.items.len()
        );
        self.items
    }
}

/// Walk a cursor-paginated listing to the end.
///
/// `fetch` is called with `None` first and then with each cursor the
/// platform returns, until a page comes back without one. A cursor is never
/// requested twice.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, PartialPages<T>>
where
    T: std::fmt::Debug,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, PlatformError>>,
{
    let mut items = Vec::new();
    let mut pages = 0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match fetch(cursor.take()).await {
            Ok(page) => page,
            Err(error) => {
                return Err(PartialPages {
                    items,
                    pages,
                    error,
                })
            }
        };
        pages += 1;
        items.extend(page.items);

        match page.next_cursor.filter(|next| !next.is_empty()) {
            Some(next) if seen.insert(next.clone()) => cursor = Some(next),
            Some(next) => {
                warn!("Cursor {} was returned twice, stopping listing", next);
                return Ok(items);
            }
            None => return Ok(items),
        }
    }
}

//! # Pagination
//!
//! Shared loop for draining paged store responses.

use crate::error::StoreError;
use std::future::Future;
use tracing::debug;

/// One page of a paged response
#[derive(Debug, Clone)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    /// Cursor for the next page, if the store returned one
    pub next: Option<C>,
    /// Whether the store said more data follows
    pub truncated: bool,
}

impl<T, C> Page<T, C> {
    /// Final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next: None,
            truncated: false,
        }
    }
}

/// Fetch pages until the store reports the end, concatenating their items.
///
/// A page that is marked truncated but carries no cursor is an error: the
/// rest of the data cannot be reached.
pub async fn drain_pages<T, C, F, Fut>(operation: &str, mut fetch: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<Page<T, C>, StoreError>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0_usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        match (page.next, page.truncated) {
            (Some(next), _) => cursor = Some(next),
            (None, true) => {
                return Err(StoreError::Truncated {
                    operation: operation.to_string(),
                })
            }
            (None, false) => break,
        }
    }

    debug!(operation, pages, items = items.len(), "Drained paged response");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drains_every_page_in_order() {
        let pages = vec![vec![1, 2], vec![3], vec![4, 5]];
        let items = drain_pages("test", |cursor: Option<usize>| {
            let index = cursor.unwrap_or(0);
            let page = pages[index].clone();
            async move {
                Ok(Page {
                    items: page,
                    next: (index + 1 < 3).then_some(index + 1),
                    truncated: index + 1 < 3,
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_truncated_without_cursor_fails() {
        let result = drain_pages("s3.list_objects", |_cursor: Option<String>| async {
            Ok(Page {
                items: vec!["a".to_string()],
                next: None,
                truncated: true,
            })
        })
        .await;
        assert!(matches!(result, Err(StoreError::Truncated { .. })));
    }

    #[tokio::test]
    async fn test_page_error_propagates() {
        let result: Result<Vec<u8>, _> = drain_pages("dynamodb.scan", |_cursor: Option<u8>| async {
            Err(StoreError::transport("dynamodb.scan", "access denied"))
        })
        .await;
        assert!(matches!(result, Err(StoreError::Transport { .. })));
    }
}

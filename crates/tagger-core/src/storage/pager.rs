//! Continuation-token pagination for bucket listings.

use std::future::Future;

/// One page of a listing response.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Keys on this page
    pub keys: Vec<String>,
    /// Token for the next page; `None` once the listing is exhausted
    pub next_token: Option<String>,
}

/// Drain a paginated listing by following continuation tokens.
///
/// `fetch` receives the token of the page to fetch (`None` for the first
/// page). Keys are returned as listed, directory placeholders included.
pub async fn collect_pages<F, Fut, E>(mut fetch: F) -> Result<Vec<String>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage, E>>,
{
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        keys.extend(page.keys);

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    tracing::debug!("Listed {} key(s) across {} page(s)", keys.len(), pages);
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn page(keys: &[&str], next: Option<&str>) -> ListPage {
        ListPage {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            next_token: next.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_follows_tokens_until_exhausted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = seen.clone();

        let keys = collect_pages(move |token: Option<String>| {
            seen_in.lock().unwrap().push(token.clone());
            async move {
                Ok::<_, String>(match token.as_deref() {
                    None => page(&["a/1.png", "a/2.png"], Some("t1")),
                    Some("t1") => page(&["a/3.png"], Some("t2")),
                    Some("t2") => page(&["a/4.png"], None),
                    Some(other) => panic!("unexpected token {other}"),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(keys, vec!["a/1.png", "a/2.png", "a/3.png", "a/4.png"]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_listing_is_ok() {
        let keys = collect_pages(|_| async { Ok::<_, String>(ListPage::default()) })
            .await
            .unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_keeps_directory_placeholders() {
        let keys = collect_pages(|_| async {
            Ok::<_, String>(page(&["charts/", "charts/a.png"], None))
        })
        .await
        .unwrap();
        assert_eq!(keys, vec!["charts/", "charts/a.png"]);
    }

    #[tokio::test]
    async fn test_error_on_later_page_propagates() {
        let result = collect_pages(|token: Option<String>| async move {
            match token {
                None => Ok(page(&["a.png"], Some("t1"))),
                Some(_) => Err("access denied".to_string()),
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), "access denied");
    }
}

use log::{debug, info, warn};
use serde_json::Value;

use crate::github::{FetchError, PageSource};

/// Walks a paginated endpoint to the end and returns every record in server
/// order.
///
/// The walk stops when a page is empty or carries no next link. A failed
/// request or a body that is not a JSON list is logged and ends the walk
/// early; whatever was collected up to that point is returned, so a short
/// result may be incomplete.
pub fn paginate<S: PageSource + ?Sized>(
    source: &S,
    url: &str,
    params: &[(&str, String)],
    per_page: u32,
) -> Vec<Value> {
    let mut records = Vec::new();
    let mut first_query: Vec<(&str, String)> = params.to_vec();
    first_query.push(("per_page", per_page.to_string()));
    first_query.push(("page", "1".to_owned()));

    let mut next_url = Some(url.to_owned());
    let mut query = first_query;
    let mut page_no = 1usize;

    while let Some(current) = next_url.take() {
        debug!("fetching page {page_no} of {current}");
        let page = match source.fetch_page(&current, &query) {
            Ok(page) => page,
            Err(err) => {
                warn!("stopping walk of {url} after {} records: {err}", records.len());
                break;
            }
        };

        let batch = match page.body {
            Value::Array(batch) => batch,
            _ => {
                let err = FetchError::MalformedPage { url: current };
                warn!("stopping walk of {url} after {} records: {err}", records.len());
                break;
            }
        };
        if batch.is_empty() {
            break;
        }

        records.extend(batch);
        // The next link already carries the full query string.
        query = Vec::new();
        next_url = page.next;
        page_no += 1;
    }

    info!("fetched {} records from {url}", records.len());
    records
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use serde_json::json;

    use super::*;
    use crate::github::Page;

    /// In-memory endpoint: each URL maps to one scripted response.
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        pages: HashMap<String, Result<Page, u16>>,
        pub(crate) requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedSource {
        pub(crate) fn page(mut self, url: &str, body: Value, next: Option<&str>) -> Self {
            self.pages.insert(
                url.to_owned(),
                Ok(Page {
                    body,
                    next: next.map(str::to_owned),
                }),
            );
            self
        }

        pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_owned(), Err(status));
            self
        }
    }

    impl PageSource for ScriptedSource {
        fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<Page, FetchError> {
            self.requests.borrow_mut().push((
                url.to_owned(),
                query
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), value.clone()))
                    .collect(),
            ));
            match self.pages.get(url) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    status: *status,
                    url: url.to_owned(),
                }),
                None => Err(FetchError::Status {
                    status: 404,
                    url: url.to_owned(),
                }),
            }
        }
    }

    fn records(range: std::ops::Range<u64>) -> Value {
        Value::Array(range.map(|n| json!({ "number": n })).collect())
    }

    fn numbers(values: &[Value]) -> Vec<u64> {
        values
            .iter()
            .filter_map(|value| value.get("number")?.as_u64())
            .collect()
    }

    #[test]
    fn walks_every_page_in_order() {
        let source = ScriptedSource::default()
            .page("https://api/x", records(0..100), Some("https://api/x?page=2"))
            .page("https://api/x?page=2", records(100..200), Some("https://api/x?page=3"))
            .page("https://api/x?page=3", records(200..230), None);

        let all = paginate(&source, "https://api/x", &[("state", "all".to_owned())], 100);
        assert_eq!(numbers(&all), (0..230).collect::<Vec<_>>());

        let requests = source.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0].1,
            vec![
                ("state".to_owned(), "all".to_owned()),
                ("per_page".to_owned(), "100".to_owned()),
                ("page".to_owned(), "1".to_owned()),
            ]
        );
        assert!(requests[1].1.is_empty());
    }

    #[test]
    fn failed_page_returns_what_was_collected() {
        let source = ScriptedSource::default()
            .page("https://api/x", records(0..100), Some("https://api/x?page=2"))
            .status("https://api/x?page=2", 502)
            .page("https://api/x?page=3", records(200..230), None);

        let all = paginate(&source, "https://api/x", &[], 100);
        assert_eq!(numbers(&all), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn failing_first_page_yields_nothing() {
        let source = ScriptedSource::default().status("https://api/x", 401);
        assert!(paginate(&source, "https://api/x", &[], 100).is_empty());
    }

    #[test]
    fn non_list_body_stops_the_walk() {
        let source = ScriptedSource::default()
            .page("https://api/x", records(0..2), Some("https://api/x?page=2"))
            .page(
                "https://api/x?page=2",
                json!({ "message": "API rate limit exceeded" }),
                Some("https://api/x?page=3"),
            );
        assert_eq!(numbers(&paginate(&source, "https://api/x", &[], 100)), vec![0, 1]);
    }

    #[test]
    fn empty_page_ends_the_walk_even_with_next_link() {
        let source = ScriptedSource::default()
            .page("https://api/x", records(0..3), Some("https://api/x?page=2"))
            .page("https://api/x?page=2", json!([]), Some("https://api/x?page=3"))
            .page("https://api/x?page=3", records(3..5), None);

        assert_eq!(numbers(&paginate(&source, "https://api/x", &[], 100)), vec![0, 1, 2]);
        assert_eq!(source.requests.borrow().len(), 2);
    }
}

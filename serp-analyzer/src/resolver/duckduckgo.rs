//! DuckDuckGo HTML results listing.
//!
//! Results are `a.result__a` anchors whose href is a `/l/?uddg=` redirect.
//! Sponsored blocks carry `result--ad` and are skipped.

use reqwest::{Client, RequestBuilder};
use scraper::Html;

use super::html::{absolute_http_url, elements, has_ancestor, has_class, query_param};
use super::ListingPage;

/// Builds the form post for one listing page starting at `offset`.
pub(super) fn page_request(
    client: &Client,
    endpoint: &str,
    language: &str,
    query: &str,
    offset: usize,
) -> RequestBuilder {
    let region = format!("{language}-{language}");
    let mut form = vec![("q", query.to_string()), ("kl", region)];
    if offset > 0 {
        form.push(("s", offset.to_string()));
        form.push(("dc", (offset + 1).to_string()));
    }
    client.post(endpoint).form(&form)
}

/// Extracts organic result URLs from a listing page.
pub(super) fn parse_listing(body: &str) -> ListingPage {
    let doc = Html::parse_document(body);

    let urls: Vec<String> = elements(&doc, "a")
        .filter(|a| has_class(*a, "result__a"))
        .filter(|a| !has_ancestor(*a, |el| has_class(el, "result--ad")))
        .filter_map(|a| a.value().attr("href").and_then(result_url))
        .collect();

    if !urls.is_empty() {
        ListingPage::Results(urls)
    } else if elements(&doc, "div").any(|div| has_class(div, "no-results")) {
        ListingPage::NoResults
    } else {
        ListingPage::Unrecognized
    }
}

fn result_url(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let url = absolute_http_url(&absolute)?;

    let is_ddg = url
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if !is_ddg {
        return Some(url.to_string());
    }
    if url.path() != "/l/" {
        // y.js and similar tracking links are ads
        return None;
    }
    let target = query_param(&url, "uddg")?;
    absolute_http_url(&target).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_parse_listing() {
        let page = parse_listing(fixtures::DUCKDUCKGO_LISTING);
        assert_eq!(
            page,
            ListingPage::Results(vec![
                "https://www.rust-lang.org/".to_string(),
                "https://doc.rust-lang.org/book/".to_string(),
                "https://crates.io/".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_no_results() {
        let body = r#"<html><body><div class="no-results">No results.</div></body></html>"#;
        assert_eq!(parse_listing(body), ListingPage::NoResults);
    }

    #[test]
    fn test_result_url_variants() {
        assert_eq!(
            result_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2F&rut=abc").as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(
            result_url("https://example.net/page").as_deref(),
            Some("https://example.net/page")
        );
        assert_eq!(result_url("https://duckduckgo.com/y.js?ad_provider=x"), None);
    }
}

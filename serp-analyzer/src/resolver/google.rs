//! Google HTML results listing.
//!
//! Organic results are anchors wrapping an `<h3>` title (desktop layout) or
//! `/url?q=` redirect anchors wrapping a title element (basic layout); bare
//! text redirect anchors are sitelinks and secondary links. Anchors inside ad blocks,
//! knowledge panels and "People also ask" widgets are skipped, as are links
//! back to Google itself.

use reqwest::{Client, RequestBuilder};
use scraper::{ElementRef, Html};
use url::Url;

use super::html::{
    absolute_http_url, elements, has_ancestor, has_child_element, has_class, has_descendant,
    query_param,
};
use super::ListingPage;

const NO_RESULTS_MARKERS: [&str; 2] = ["did not match any documents", "No results found for"];

/// Container ids holding sponsored results or side panels.
const EXCLUDED_IDS: [&str; 4] = ["tads", "tadsb", "bottomads", "rhs"];

/// Container classes holding sponsored results or answer widgets.
const EXCLUDED_CLASSES: [&str; 5] = [
    "commercial-unit-desktop-top",
    "uEierd",
    "kp-wholepage",
    "related-question-pair",
    "knowledge-panel",
];

/// Builds the request for one listing page starting at `offset`.
pub(super) fn page_request(
    client: &Client,
    endpoint: &str,
    language: &str,
    query: &str,
    offset: usize,
    wanted: usize,
) -> RequestBuilder {
    // Ask for a couple extra since some entries are filtered out.
    let num = (wanted + 2).min(100).to_string();
    let start = offset.to_string();
    client.get(endpoint).query(&[
        ("q", query),
        ("num", num.as_str()),
        ("hl", language),
        ("start", start.as_str()),
    ])
}

/// Extracts organic result URLs from a listing page.
pub(super) fn parse_listing(body: &str) -> ListingPage {
    let doc = Html::parse_document(body);

    let urls: Vec<String> = elements(&doc, "a")
        .filter(|a| !is_excluded(*a))
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let is_candidate = has_descendant(a, "h3")
                || (href.starts_with("/url?") && has_child_element(a));
            if is_candidate {
                result_url(href)
            } else {
                None
            }
        })
        .collect();

    if !urls.is_empty() {
        ListingPage::Results(urls)
    } else if NO_RESULTS_MARKERS.iter().any(|m| body.contains(m)) {
        ListingPage::NoResults
    } else {
        ListingPage::Unrecognized
    }
}

fn is_excluded(anchor: ElementRef<'_>) -> bool {
    has_ancestor(anchor, |el| {
        el.value().id().is_some_and(|id| EXCLUDED_IDS.contains(&id))
            || el.value().attr("data-text-ad").is_some()
            || EXCLUDED_CLASSES.iter().any(|class| has_class(el, class))
    })
}

/// Resolves an anchor href to the destination URL, unwrapping redirects.
fn result_url(href: &str) -> Option<String> {
    let url = if href.starts_with("/url?") {
        let redirect = Url::parse("https://www.google.com").ok()?.join(href).ok()?;
        let target = query_param(&redirect, "q").or_else(|| query_param(&redirect, "url"))?;
        absolute_http_url(&target)?
    } else {
        absolute_http_url(href)?
    };

    if url.host_str().is_some_and(is_google_host) {
        None
    } else {
        Some(url.to_string())
    }
}

fn is_google_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    host.starts_with("google.")
        || host.ends_with(".google.com")
        || host.ends_with(".googleusercontent.com")
        || host == "googleadservices.com"
}

//! DOM helpers shared by the listing parsers.

use scraper::{ElementRef, Html};
use url::Url;

/// All elements named `tag`, in document order.
pub(super) fn elements<'a>(
    doc: &'a Html,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

/// Whether `el` carries `class` in its class list.
pub(super) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Whether any ancestor of `el` satisfies `pred`.
pub(super) fn has_ancestor(el: ElementRef<'_>, pred: impl Fn(ElementRef<'_>) -> bool) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(pred)
}

/// Whether `el` has a descendant element named `tag`.
pub(super) fn has_descendant(el: ElementRef<'_>, tag: &str) -> bool {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|d| d.value().name() == tag)
}

/// Whether `el` has at least one child element, as opposed to bare text.
pub(super) fn has_child_element(el: ElementRef<'_>) -> bool {
    el.children().any(|child| child.value().is_element())
}

/// Parses `candidate` as an absolute http(s) URL with a host.
pub(super) fn absolute_http_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

/// Value of query parameter `name` in `url`.
pub(super) fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_http_url() {
        assert!(absolute_http_url("https://example.com/x").is_some());
        assert!(absolute_http_url("/relative").is_none());
        assert!(absolute_http_url("javascript:void(0)").is_none());
    }

    #[test]
    fn test_class_and_ancestor_helpers() {
        let doc = Html::parse_document(
            r#"<div id="tads" class="ads block"><a href="/x"><h3>Ad</h3></a></div>"#,
        );
        let anchor = elements(&doc, "a").next().unwrap();

        assert!(has_descendant(anchor, "h3"));
        assert!(has_child_element(anchor));
        assert!(!has_descendant(anchor, "span"));
        assert!(has_ancestor(anchor, |el| el.value().id() == Some("tads")));
        assert!(has_ancestor(anchor, |el| has_class(el, "block")));
        assert!(!has_ancestor(anchor, |el| has_class(el, "organic")));
    }

    #[test]
    fn test_text_only_anchor_has_no_child_element() {
        let doc = Html::parse_document(
            r#"<div><a href="/url?q=https://example.com/docs">Docs</a></div>"#,
        );
        let anchor = elements(&doc, "a").next().unwrap();
        assert!(!has_child_element(anchor));
    }

    #[test]
    fn test_query_param_decodes() {
        let url = Url::parse(
            "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc&rut=1",
        )
        .unwrap();
        assert_eq!(
            query_param(&url, "uddg").as_deref(),
            Some("https://example.com/a?b=c")
        );
        assert_eq!(query_param(&url, "missing"), None);
    }
}

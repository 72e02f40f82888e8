//! DOM-backed implementation of [`HtmlDocument`].

use scraper::{ElementRef, Html};

use super::HtmlDocument;

/// An HTML document parsed with `scraper` (html5ever).
///
/// Parsing never fails; malformed markup is recovered the way browsers do.
#[derive(Debug, Clone)]
pub struct ScraperDocument {
    html: Html,
}

impl ScraperDocument {
    /// Parses a full document.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Elements with the given tag name in document order.
    fn elements<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |el| el.value().name().eq_ignore_ascii_case(tag))
    }
}

/// Joins an element's text nodes and collapses whitespace runs.
fn normalized_text(element: ElementRef<'_>) -> String {
    let joined: String = element.text().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl HtmlDocument for ScraperDocument {
    fn first_text(&self, tag: &str) -> Option<String> {
        self.elements(tag).next().map(normalized_text)
    }

    fn all_texts(&self, tag: &str) -> Vec<String> {
        self.elements(tag).map(normalized_text).collect()
    }

    fn find_attr(
        &self,
        tag: &str,
        match_attr: &str,
        match_value: &str,
        wanted: &str,
    ) -> Option<String> {
        self.elements(tag)
            .find(|el| {
                el.value()
                    .attrs()
                    .any(|(name, value)| {
                        name.eq_ignore_ascii_case(match_attr)
                            && value.trim().eq_ignore_ascii_case(match_value)
                    })
            })
            .and_then(|el| {
                el.value()
                    .attrs()
                    .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                    .map(|(_, value)| value.to_string())
            })
    }
}

//! Structural field extraction from raw HTML.
//!
//! Extraction is pure and infallible: whatever the markup looks like, the
//! result is a [`PageFields`] with absent title/description and empty heading
//! lists where nothing could be found.

mod document;

pub use document::ScraperDocument;

use crate::models::{HeadingLevel, PageFields};

/// Query capabilities needed from a parsed HTML document.
pub trait HtmlDocument {
    /// Whitespace-normalized text of the first element with `tag`.
    fn first_text(&self, tag: &str) -> Option<String>;

    /// Whitespace-normalized text of every element with `tag`, in document order.
    fn all_texts(&self, tag: &str) -> Vec<String>;

    /// Value of attribute `wanted` on the first `tag` element whose
    /// `match_attr` equals `match_value` (ASCII case-insensitive).
    fn find_attr(
        &self,
        tag: &str,
        match_attr: &str,
        match_value: &str,
        wanted: &str,
    ) -> Option<String>;
}

/// Parses `html` and extracts its title, meta description and headings.
#[must_use]
pub fn extract(html: &str) -> PageFields {
    extract_from(&ScraperDocument::parse(html))
}

/// Extracts fields from an already parsed document.
pub fn extract_from<D: HtmlDocument + ?Sized>(document: &D) -> PageFields {
    let mut fields = PageFields {
        title: document.first_text("title").filter(|t| !t.is_empty()),
        meta_description: document
            .find_attr("meta", "name", "description", "content")
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty()),
        ..PageFields::default()
    };

    for level in HeadingLevel::ALL {
        *fields.headers.get_mut(level) = document.all_texts(level.tag());
    }

    fields
}

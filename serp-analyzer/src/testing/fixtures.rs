//! Canned markup for listing parsers and the extractor.

use std::fmt::Write as _;

/// Google desktop listing with ads, a knowledge panel and "People also ask".
pub const GOOGLE_DESKTOP_LISTING: &str = r#"<!doctype html>
<html><head><title>rust language - Google Search</title></head>
<body>
<div id="searchform"><a href="https://accounts.google.com/ServiceLogin">Sign in</a></div>
<div id="tads">
  <div data-text-ad="1">
    <a href="https://ads.example.net/landing"><h3>Learn Rust in 24 hours</h3></a>
  </div>
</div>
<div id="search">
  <div class="g">
    <a href="https://www.rust-lang.org/"><br><h3>Rust Programming Language</h3><cite>rust-lang.org</cite></a>
  </div>
  <div class="related-question-pair">
    <a href="https://stackoverflow.com/questions/1"><h3>Is Rust hard to learn?</h3></a>
  </div>
  <div class="g">
    <a href="https://en.wikipedia.org/wiki/Rust_(programming_language)"><h3>Rust (programming language) - Wikipedia</h3></a>
  </div>
  <div class="g">
    <a href="https://maps.google.com/maps?q=rust"><h3>Rust on Maps</h3></a>
  </div>
  <div class="g">
    <a href="https://github.com/rust-lang/rust"><h3>rust-lang/rust - GitHub</h3></a>
    <a href="https://github.com/rust-lang/rust/issues">Issues</a>
  </div>
</div>
<div id="rhs">
  <div class="kp-wholepage">
    <a href="https://www.britannica.com/rust"><h3>Rust</h3></a>
  </div>
</div>
<div id="bottomads">
  <a href="https://ads.example.net/bottom"><h3>Rust jobs</h3></a>
</div>
</body></html>"#;

/// Google basic (no-JS) listing using `/url?q=` redirect anchors.
pub const GOOGLE_BASIC_LISTING: &str = r#"<html><body>
<div id="main">
  <div>
    <a href="/url?q=https://example.com/a%3Fx%3D1&amp;sa=U&amp;ved=2ah"><span>Example A</span></a>
    <div><a href="/url?q=https://example.com/docs&amp;sa=U">Docs</a> · <a href="/url?q=https://example.com/blog&amp;sa=U">Blog</a></div>
  </div>
  <div><a href="/url?q=https://www.google.com/preferences&amp;sa=U">Settings</a></div>
  <div><a href="/url?q=https://example.org/&amp;sa=U&amp;ved=2ah"><span>Example Org</span></a></div>
  <div><a href="/search?q=rust&amp;start=10">Next</a></div>
</div>
</body></html>"#;

/// Google listing for a query nothing matched.
pub const GOOGLE_NO_RESULTS: &str = r#"<html><body>
<div id="topstuff">
  <p>Your search - <em>zzqxj</em> - did not match any documents.</p>
  <p>Suggestions: Make sure that all words are spelled correctly.</p>
</div>
</body></html>"#;

/// Google block page served to suspected automated clients.
pub const GOOGLE_CAPTCHA: &str = r#"<html><head><title>https://www.google.com/search?q=rust</title></head>
<body>
<div>Our systems have detected unusual traffic from your computer network.</div>
<form id="captcha-form" action="index" method="post">
  <div class="g-recaptcha" data-sitekey="x"></div>
</form>
</body></html>"#;

/// DuckDuckGo HTML listing with a sponsored result.
pub const DUCKDUCKGO_LISTING: &str = r#"<html><body>
<div class="results">
  <div class="result results_links result--ad">
    <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=bingv7aa&amp;u3=x">Rust Courses</a>
  </div>
  <div class="result results_links results_links_deep web-result">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust Programming Language</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">A language empowering everyone.</a>
  </div>
  <div class="result results_links results_links_deep web-result">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=def">The Rust Programming Language</a>
    </h2>
  </div>
  <div class="result results_links results_links_deep web-result">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://crates.io/">crates.io: Rust Package Registry</a>
    </h2>
  </div>
</div>
</body></html>"#;

/// An article page with every extracted field present.
pub const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Rust Ownership Explained</title>
  <meta name="description" content="A short guide to ownership and borrowing.">
</head>
<body>
  <h1>Ownership</h1>
  <h2>Moves</h2>
  <h2>Borrowing</h2>
  <h3>Mutable references</h3>
  <p>Body text.</p>
</body>
</html>"#;

/// Builds a Google desktop listing linking `urls` in order.
#[must_use]
pub fn google_listing(urls: &[&str]) -> String {
    let mut html = String::from("<html><body><div id=\"search\">\n");
    for (i, url) in urls.iter().enumerate() {
        let _ = writeln!(
            html,
            "<div class=\"g\"><a href=\"{url}\"><h3>Result {}</h3></a></div>",
            i + 1
        );
    }
    html.push_str("</div></body></html>");
    html
}

/// Builds a DuckDuckGo HTML listing linking `urls` directly, in order.
#[must_use]
pub fn duckduckgo_listing(urls: &[&str]) -> String {
    let mut html = String::from("<html><body><div class=\"results\">\n");
    for (i, url) in urls.iter().enumerate() {
        let _ = writeln!(
            html,
            "<div class=\"result web-result\"><h2 class=\"result__title\"><a class=\"result__a\" href=\"{url}\">Result {}</a></h2></div>",
            i + 1
        );
    }
    html.push_str("</div></body></html>");
    html
}

/// Builds a page with the given title and one `<h1>` per heading.
#[must_use]
pub fn page_with_headings(title: &str, h1s: &[&str]) -> String {
    let mut html = format!("<html><head><title>{title}</title></head><body>");
    for heading in h1s {
        let _ = write!(html, "<h1>{heading}</h1>");
    }
    html.push_str("</body></html>");
    html
}

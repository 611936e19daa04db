//! Page-content features: fetch, parse into a [`PageDocument`], then derive the
//! link/form/title heuristics. A failed fetch leaves every field at its default.

mod document;
mod fetch;

pub use document::{Form, Link, PageDocument};
pub use fetch::{FetchError, FetchedPage, Fetcher};

use crate::config::FetchConfig;
use serde::{Deserialize, Serialize};

/// Content fields of the record. `Default` is the failure tuple (all zero).
///
/// Redirect, error and media ratios and popup detection are not measured; the
/// record carries them as 0 and they have no field here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    pub nb_hyperlinks: i64,
    pub ratio_int_hyperlinks: f64,
    pub ratio_ext_hyperlinks: f64,
    pub ratio_null_hyperlinks: f64,
    pub nb_ext_css: i64,
    pub login_form: i64,
    pub external_favicon: i64,
    pub links_in_tags: i64,
    pub submit_email: i64,
    pub sfh: i64,
    pub iframe: i64,
    pub safe_anchor: i64,
    pub onmouseover: i64,
    pub right_clic: i64,
    pub empty_title: i64,
    pub domain_in_title: i64,
    pub domain_with_copyright: i64,
}

fn flag(b: bool) -> i64 {
    b as i64
}

fn href_of(link: &Link) -> &str {
    link.href.as_deref().unwrap_or("")
}

/// Whether `text` mentions the domain label. An empty label mentions nothing.
fn mentions(text: &str, domain: &str) -> bool {
    !domain.is_empty() && text.contains(domain)
}

impl ContentFeatures {
    /// `domain` is the page's registrable label (`paypal` for `www.paypal.com`);
    /// a link is internal when its raw target contains it.
    pub fn from_document(doc: &PageDocument, domain: &str) -> Self {
        let total = doc.links.len();
        let internal = doc.links.iter().filter(|&l| mentions(href_of(l), domain)).count();
        let null = doc.links.iter().filter(|&l| href_of(l).is_empty()).count();
        let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };

        let external_favicon = doc.favicon.as_ref().is_some_and(|fav| {
            let href = href_of(fav);
            let target = fav
                .resolved
                .as_ref()
                .and_then(|u| u.host_str())
                .unwrap_or(href);
            href.contains("favicon") && !mentions(target, domain)
        });

        let title = doc.title.as_deref().map(str::trim);
        let body_lower = doc.body.to_lowercase();

        Self {
            nb_hyperlinks: total as i64,
            ratio_int_hyperlinks: ratio(internal),
            ratio_ext_hyperlinks: ratio(total - internal),
            ratio_null_hyperlinks: ratio(null),
            nb_ext_css: doc.stylesheets.iter().filter(|h| !mentions(h, domain)).count() as i64,
            login_form: flag(doc.has_password_input),
            external_favicon: flag(external_favicon),
            links_in_tags: flag(doc.has_script_or_link),
            submit_email: flag(doc.body.contains("mailto:")),
            sfh: flag(doc.forms.iter().any(|f| f.action.as_deref() == Some("#"))),
            iframe: flag(doc.has_iframe),
            safe_anchor: flag(
                doc.links
                    .iter()
                    .all(|l| !matches!(l.href.as_deref(), Some("" | "#"))),
            ),
            onmouseover: flag(doc.body.contains("onmouseover")),
            right_clic: flag(doc.body.contains("contextmenu")),
            empty_title: flag(title.map_or(true, str::is_empty)),
            domain_in_title: flag(title.is_some_and(|t| mentions(&t.to_lowercase(), domain))),
            domain_with_copyright: flag(doc.body.contains('©') || body_lower.contains("copyright")),
        }
    }
}

pub struct ContentAnalyzer {
    fetcher: Fetcher,
}

impl ContentAnalyzer {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
        })
    }

    /// Fetch `url` and derive its content features.
    pub async fn analyze(&self, url: &str, domain: &str) -> Result<ContentFeatures, FetchError> {
        let page = self.fetcher.fetch(url).await?;
        tracing::debug!(url = %page.url, status = page.status, bytes = page.body.len(), "page fetched");
        let base = page.url.clone();
        let doc = PageDocument::parse(page.body, Some(&base));
        Ok(ContentFeatures::from_document(&doc, domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn features(html: &str, base: &str, domain: &str) -> ContentFeatures {
        let base = Url::parse(base).unwrap();
        let doc = PageDocument::parse(html.to_string(), Some(&base));
        ContentFeatures::from_document(&doc, domain)
    }

    #[test]
    fn no_links_means_zero_ratios() {
        let f = features("<html><title>x</title><p>hi</p></html>", "http://a.com/", "a");
        assert_eq!(f.nb_hyperlinks, 0);
        assert_eq!(f.ratio_int_hyperlinks, 0.0);
        assert_eq!(f.ratio_ext_hyperlinks, 0.0);
        assert_eq!(f.ratio_null_hyperlinks, 0.0);
        assert_eq!(f.safe_anchor, 1);
    }

    #[test]
    fn link_ratios() {
        let html = r##"
            <a href="https://shop.example.com/a">1</a>
            <a href="https://other.net/">2</a>
            <a href="">3</a>
            <a>4</a>"##;
        let f = features(html, "https://shop.example.com/", "example");
        assert_eq!(f.nb_hyperlinks, 4);
        assert_eq!(f.ratio_int_hyperlinks, 0.25);
        assert_eq!(f.ratio_ext_hyperlinks, 0.75);
        assert_eq!(f.ratio_null_hyperlinks, 0.5);
        assert_eq!(f.safe_anchor, 0);
        let sum = f.ratio_int_hyperlinks + f.ratio_ext_hyperlinks;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn form_and_page_flags() {
        let html = r##"<html><head><title>Example - Sign in</title>
            <link rel="stylesheet" href="https://example.com/site.css">
            <link rel="stylesheet" href="https://cdn.evil.net/kit.css">
            <link rel="icon" href="https://evil.net/favicon.ico">
            </head><body onmouseover="x()" oncontextmenu="return false">
            <form action="#"><input type="password"></form>
            <a href="mailto:help@example.com">mail</a>
            <iframe src="x"></iframe>
            <footer>&copy; 2024</footer></body></html>"##;
        let f = features(html, "https://example.com/", "example");
        assert_eq!(f.nb_ext_css, 1);
        assert_eq!(f.login_form, 1);
        assert_eq!(f.external_favicon, 1);
        assert_eq!(f.links_in_tags, 1);
        assert_eq!(f.submit_email, 1);
        assert_eq!(f.sfh, 1);
        assert_eq!(f.iframe, 1);
        assert_eq!(f.onmouseover, 1);
        assert_eq!(f.right_clic, 1);
        assert_eq!(f.empty_title, 0);
        assert_eq!(f.domain_in_title, 1);
        assert_eq!(f.domain_with_copyright, 0);
        assert_eq!(f.safe_anchor, 1);
    }

    #[test]
    fn copyright_word_and_symbol() {
        let f = features("<p>Copyright 2020</p>", "http://a.com/", "a");
        assert_eq!(f.domain_with_copyright, 1);
        let f = features("<p>© ACME</p>", "http://a.com/", "a");
        assert_eq!(f.domain_with_copyright, 1);
    }

    #[test]
    fn same_site_favicon_is_not_external() {
        let html = r#"<link rel="shortcut icon" href="/static/favicon.ico">"#;
        let f = features(html, "https://www.example.com/", "example");
        assert_eq!(f.external_favicon, 0);
    }

    #[test]
    fn blank_or_missing_title() {
        assert_eq!(features("<title>   </title>", "http://a.com/", "a").empty_title, 1);
        assert_eq!(features("<p>x</p>", "http://a.com/", "a").empty_title, 1);
        assert_eq!(features("<p>x</p>", "http://a.com/", "a").domain_in_title, 0);
    }

    #[test]
    fn empty_domain_label_matches_nothing() {
        let html = r#"<html><head><title>Welcome</title>
            <link rel="stylesheet" href="https://cdn.other.net/a.css">
            <link rel="icon" href="https://cdn.other.net/favicon.ico"></head>
            <body><a href="https://elsewhere.org/">x</a></body></html>"#;
        let f = features(html, "http://paypal-secure-login.tk/verify", "");
        assert_eq!(f.ratio_int_hyperlinks, 0.0);
        assert_eq!(f.ratio_ext_hyperlinks, 1.0);
        assert_eq!(f.nb_ext_css, 1);
        assert_eq!(f.external_favicon, 1);
        assert_eq!(f.domain_in_title, 0);
    }

    #[test]
    fn whitespace_href_is_neither_null_nor_unsafe() {
        let f = features(r#"<a href=" ">1</a><a href="https://a.com/">2</a>"#, "http://a.com/", "a");
        assert_eq!(f.ratio_null_hyperlinks, 0.0);
        assert_eq!(f.safe_anchor, 1);
        let f = features(r#"<a href="">1</a>"#, "http://a.com/", "a");
        assert_eq!(f.ratio_null_hyperlinks, 1.0);
        assert_eq!(f.safe_anchor, 0);
    }

    #[test]
    fn default_is_failure_tuple() {
        let f = ContentFeatures::default();
        assert_eq!(f.nb_hyperlinks, 0);
        assert_eq!(f.safe_anchor, 0);
        assert_eq!(f.empty_title, 0);
    }
}

//! Typed view of a fetched HTML page. Parsing never fails; whatever html5ever
//! recovers from malformed markup is what the heuristics see.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("link"));
static INPUT: Lazy<Selector> = Lazy::new(|| selector("input"));
static IFRAME: Lazy<Selector> = Lazy::new(|| selector("iframe"));
static SCRIPT_OR_LINK: Lazy<Selector> = Lazy::new(|| selector("script, link"));

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Raw `href`; `None` when the attribute is missing
    pub href: Option<String>,
    /// `href` resolved against the page URL
    pub resolved: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    /// Every `<a>` in document order
    pub links: Vec<Link>,
    pub title: Option<String>,
    pub forms: Vec<Form>,
    pub stylesheets: Vec<String>,
    /// First `<link rel="icon">`
    pub favicon: Option<Link>,
    pub has_password_input: bool,
    pub has_iframe: bool,
    pub has_script_or_link: bool,
    /// Raw markup, for substring heuristics
    pub body: String,
}

fn rel_has(el: &ElementRef<'_>, token: &str) -> bool {
    el.value()
        .attr("rel")
        .is_some_and(|rel| rel.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
}

impl PageDocument {
    pub fn parse(body: String, base: Option<&Url>) -> Self {
        let html = Html::parse_document(&body);
        let resolve = |href: &str| base.and_then(|b| b.join(href.trim()).ok());
        let link_of = |href: Option<&str>| Link {
            href: href.map(str::to_string),
            resolved: href.and_then(resolve),
        };

        let links = html
            .select(&ANCHOR)
            .map(|a| link_of(a.value().attr("href")))
            .collect();

        let title = html
            .select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>());

        let forms = html
            .select(&FORM)
            .map(|f| Form {
                action: f.value().attr("action").map(str::to_string),
            })
            .collect();

        let mut stylesheets = Vec::new();
        let mut favicon = None;
        for el in html.select(&LINK) {
            let href = el.value().attr("href");
            if rel_has(&el, "stylesheet") {
                stylesheets.push(href.unwrap_or_default().to_string());
            }
            if favicon.is_none() && rel_has(&el, "icon") {
                favicon = Some(link_of(href));
            }
        }

        let has_password_input = html.select(&INPUT).any(|i| {
            i.value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
        });
        let has_iframe = html.select(&IFRAME).next().is_some();
        let has_script_or_link = html.select(&SCRIPT_OR_LINK).next().is_some();

        Self {
            links,
            title,
            forms,
            stylesheets,
            favicon,
            has_password_input,
            has_iframe,
            has_script_or_link,
            body,
        }
    }
}

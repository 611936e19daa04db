//! Lexical features: pure functions over the URL string and its components.
//! Nothing here performs I/O and nothing here fails; degenerate input gives zeros.

use crate::config::KeywordLists;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PATH_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([a-zA-Z0-9]+)$").unwrap());
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4,}").unwrap());

const COUNTED_CHARS: [char; 17] = [
    '.', '-', '@', '?', '&', '|', '=', '_', '~', '%', '/', '*', ':', ',', ';', '$', ' ',
];

/// Generic URL components, split without validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: String,
    pub netloc: &'a str,
    /// Lowercased, without userinfo, port or IPv6 brackets
    pub hostname: String,
    pub port: Option<u16>,
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: &'a str,
}

impl<'a> UrlParts<'a> {
    /// Split `scheme://netloc/path?query#fragment`. Missing parts are empty.
    pub fn split(url: &'a str) -> Self {
        let mut parts = UrlParts::default();
        let mut rest = url;

        if let Some(i) = rest.find(':') {
            let cand = &rest[..i];
            let valid = cand.starts_with(|c: char| c.is_ascii_alphabetic())
                && cand
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if valid {
                parts.scheme = cand.to_ascii_lowercase();
                rest = &rest[i + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            parts.netloc = &after[..end];
            rest = &after[end..];
        }

        if let Some(i) = rest.find('#') {
            parts.fragment = &rest[i + 1..];
            rest = &rest[..i];
        }
        if let Some(i) = rest.find('?') {
            parts.query = &rest[i + 1..];
            rest = &rest[..i];
        }
        parts.path = rest;

        let hostport = parts.netloc.rsplit_once('@').map_or(parts.netloc, |(_, h)| h);
        let (host, port) = if let Some(inner) = hostport.strip_prefix('[') {
            match inner.split_once(']') {
                Some((h, tail)) => (h, tail.strip_prefix(':')),
                None => (inner, None),
            }
        } else {
            match hostport.split_once(':') {
                Some((h, p)) => (h, Some(p)),
                None => (hostport, None),
            }
        };
        parts.hostname = host.to_lowercase();
        parts.port = port
            .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|p| p.parse().ok());
        parts
    }
}

/// Host split into subdomain, registrable label and public suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostParts {
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
    pub is_ip: bool,
}

impl HostParts {
    pub fn from_hostname(hostname: &str) -> Self {
        if is_ip_literal(hostname) {
            return Self {
                domain: hostname.to_string(),
                is_ip: true,
                ..Default::default()
            };
        }
        let host = hostname.trim_end_matches('.');
        let suffix = icann_suffix(host);

        let head = if suffix.is_empty() {
            host
        } else if host.len() > suffix.len() {
            host[..host.len() - suffix.len()].trim_end_matches('.')
        } else {
            ""
        };
        let (subdomain, domain) = match head.rsplit_once('.') {
            Some((sub, dom)) => (sub, dom),
            None => ("", head),
        };
        Self {
            subdomain: subdomain.to_string(),
            domain: domain.to_string(),
            suffix: suffix.to_string(),
            is_ip: false,
        }
    }

    /// `domain.suffix`, the name WHOIS and DNS are asked about.
    pub fn registrable(&self) -> Option<String> {
        if self.is_ip || self.domain.is_empty() || self.suffix.is_empty() {
            return None;
        }
        Some(format!("{}.{}", self.domain, self.suffix))
    }
}

/// Longest trailing run of labels that is itself an ICANN public suffix. Private-section
/// entries (`github.io`, `blogspot.com`) are skipped, so `a.github.io` has suffix `io`.
fn icann_suffix(host: &str) -> &str {
    let mut candidate = host;
    while !candidate.is_empty() {
        let whole = psl::suffix(candidate.as_bytes()).is_some_and(|s| {
            s.is_known() && s.typ() == Some(psl::Type::Icann) && s.as_bytes() == candidate.as_bytes()
        });
        if whole {
            return candidate;
        }
        candidate = candidate.split_once('.').map_or("", |(_, rest)| rest);
    }
    ""
}

/// Host the way a registry-name splitter reads it: an optional `scheme:` followed by
/// `//` is skipped, so scheme-less input (`example.com/login`) still yields a host.
/// Userinfo and port are dropped; the result is lowercased.
pub fn registry_host(url: &str) -> String {
    let mut rest = url.trim();
    if let Some(i) = rest.find("//") {
        let prefix = &rest[..i];
        let scheme_like = prefix.is_empty()
            || prefix.strip_suffix(':').is_some_and(|sch| {
                sch.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            });
        if scheme_like {
            rest = &rest[i + 2..];
        }
    }
    let netloc = &rest[..rest.find(['/', '?', '#']).unwrap_or(rest.len())];
    let hostport = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);
    let host = match hostport.strip_prefix('[') {
        Some(inner) => inner.split_once(']').map_or(inner, |(h, _)| h),
        None => hostport.split_once(':').map_or(hostport, |(h, _)| h),
    };
    host.trim_end_matches('.').to_lowercase()
}

/// IPv4 in any dotted/numeric form (`10.0.0.1`, `0x7f.1`, `3232235777`) or an IPv6 literal.
pub fn is_ip_literal(hostname: &str) -> bool {
    if hostname.is_empty() {
        return false;
    }
    if hostname.contains(':') {
        return hostname.parse::<std::net::Ipv6Addr>().is_ok();
    }
    matches!(url::Host::parse(hostname), Ok(url::Host::Ipv4(_)))
}

/// Shortest, longest and mean length of a group of segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WordStats {
    pub count: i64,
    pub shortest: i64,
    pub longest: i64,
    pub average: f64,
}

impl WordStats {
    pub fn of<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let lens: Vec<i64> = words.into_iter().map(|w| w.chars().count() as i64).collect();
        if lens.is_empty() {
            return Self::default();
        }
        let total: i64 = lens.iter().sum();
        Self {
            count: lens.len() as i64,
            shortest: lens.iter().copied().min().unwrap_or(0),
            longest: lens.iter().copied().max().unwrap_or(0),
            average: total as f64 / lens.len() as f64,
        }
    }
}

/// Split on every non-word character; adjacent separators yield empty segments.
fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '_'))
}

fn flag(b: bool) -> i64 {
    b as i64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn has_char_run(s: &str, min: usize) -> bool {
    let mut prev = None;
    let mut run = 0;
    for c in s.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= min {
            return true;
        }
    }
    false
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Everything derivable from the URL string alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalFeatures {
    pub url: String,
    pub hostname: String,
    pub host: HostParts,
    pub length_url: i64,
    pub length_hostname: i64,
    pub ip: i64,
    /// Occurrences of each of `. - @ ? & | = _ ~ % / * : , ; $ space`, in that order
    pub char_counts: [i64; 17],
    pub nb_www: i64,
    pub nb_com: i64,
    pub nb_dslash: i64,
    pub http_in_path: i64,
    pub https_token: i64,
    pub ratio_digits_url: f64,
    pub ratio_digits_host: f64,
    pub punycode: i64,
    pub port: i64,
    pub tld_in_path: i64,
    pub tld_in_subdomain: i64,
    pub abnormal_subdomain: i64,
    pub nb_subdomains: i64,
    pub prefix_suffix: i64,
    pub random_domain: i64,
    pub shortening_service: i64,
    pub path_extension: String,
    pub raw_words: WordStats,
    pub host_words: WordStats,
    pub path_words: WordStats,
    pub char_repeat: i64,
    pub phish_hints: i64,
    pub domain_in_brand: i64,
    pub brand_in_subdomain: i64,
    pub brand_in_path: i64,
    pub suspecious_tld: i64,
}

impl LexicalFeatures {
    /// `lists` must already be lowercased (see [`KeywordLists::normalized`]).
    pub fn analyze(url: &str, lists: &KeywordLists) -> Self {
        let parts = UrlParts::split(url);
        let host = HostParts::from_hostname(&registry_host(url));
        let hostname = parts.hostname.as_str();
        let path = parts.path;

        let url_len = url.chars().count();
        let host_len = hostname.chars().count();
        let digits_url = url.chars().filter(|c| c.is_ascii_digit()).count();
        let digits_host = hostname.chars().filter(|c| c.is_ascii_digit()).count();

        let mut char_counts = [0i64; 17];
        for (slot, c) in char_counts.iter_mut().zip(COUNTED_CHARS) {
            *slot = url.matches(c).count() as i64;
        }

        let suffix = host.suffix.as_str();
        let subdomain = host.subdomain.as_str();
        let url_lower = url.to_lowercase();
        let domain_lower = host.domain.to_lowercase();
        let path_lower = path.to_lowercase();

        Self {
            url: url.to_string(),
            hostname: hostname.to_string(),
            length_url: url_len as i64,
            length_hostname: host_len as i64,
            ip: flag(host.is_ip),
            char_counts,
            nb_www: flag(hostname.contains("www")),
            nb_com: url.matches(".com").count() as i64,
            nb_dslash: url.matches("//").count() as i64,
            http_in_path: flag(path.contains("http")),
            https_token: flag(url.contains("https") && !url.starts_with("https")),
            ratio_digits_url: ratio(digits_url, url_len),
            ratio_digits_host: ratio(digits_host, host_len),
            punycode: flag(hostname.contains("xn--")),
            port: flag(parts.port.is_some_and(|p| p != 0)),
            tld_in_path: flag(!suffix.is_empty() && path.contains(suffix)),
            tld_in_subdomain: flag(!suffix.is_empty() && subdomain.contains(suffix)),
            abnormal_subdomain: flag(subdomain.chars().count() > 1 && subdomain.contains('-')),
            nb_subdomains: if subdomain.is_empty() {
                0
            } else {
                subdomain.matches('.').count() as i64 + 1
            },
            prefix_suffix: flag(host.domain.contains('-')),
            random_domain: flag(DIGIT_RUN.is_match(&host.domain)),
            shortening_service: flag(contains_any(url, &lists.shorteners)),
            path_extension: PATH_EXTENSION
                .captures(path)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            raw_words: WordStats::of(words(url)),
            host_words: if hostname.is_empty() {
                WordStats::default()
            } else {
                WordStats::of(hostname.split('.'))
            },
            path_words: WordStats::of(words(path)),
            char_repeat: flag(has_char_run(url, 4)),
            phish_hints: flag(contains_any(&url_lower, &lists.phish_hints)),
            domain_in_brand: flag(contains_any(&domain_lower, &lists.brands)),
            brand_in_subdomain: flag(contains_any(&subdomain.to_lowercase(), &lists.brands)),
            brand_in_path: flag(contains_any(&path_lower, &lists.brands)),
            suspecious_tld: flag(lists.suspicious_tlds.iter().any(|t| t == suffix)),
            host,
        }
    }

    pub fn char_count(&self, c: char) -> i64 {
        COUNTED_CHARS
            .iter()
            .position(|&k| k == c)
            .map_or(0, |i| self.char_counts[i])
    }
}

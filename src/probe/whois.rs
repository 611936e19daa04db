//! WHOIS (RFC 3912) client: root referral, registry query, optional registrar hop,
//! and date extraction from the free-form reply.

use super::ProbeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WHOIS_PORT: u16 = 43;
const MAX_REPLY_BYTES: u64 = 512 * 1024;

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "creation time",
    "registered",
    "registered on",
    "registration date",
    "registration time",
    "domain registration date",
    "domain create date",
    "domain record activated",
    "domain name commencement date",
    "commencement date",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiration time",
    "expiry date",
    "expiry",
    "expires",
    "expires on",
    "expire date",
    "paid-till",
    "domain expiration date",
    "domain expires",
    "record expires on",
    "renewal date",
];

const NOT_FOUND_MARKERS: &[&str] = &[
    "no match for",
    "no match!!",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
    "domain not found",
    "status: free",
    "status: available",
    "is available for registration",
];

/// Creation and expiration times from a registry reply, as written (no zone
/// conversion; date-only values are midnight). Either may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registration {
    pub created: Option<NaiveDateTime>,
    pub expires: Option<NaiveDateTime>,
}

impl Registration {
    fn merge(self, fallback: Registration) -> Registration {
        Registration {
            created: self.created.or(fallback.created),
            expires: self.expires.or(fallback.expires),
        }
    }
}

/// Send one query and read the whole reply.
pub async fn query(server: &str, query: &str) -> Result<String, ProbeError> {
    let addr = with_port(server);
    let mut stream = TcpStream::connect(&addr).await?;
    stream.write_all(format!("{}\r\n", query).as_bytes()).await?;
    let mut buf = Vec::new();
    stream.take(MAX_REPLY_BYTES).read_to_end(&mut buf).await?;
    if buf.iter().all(u8::is_ascii_whitespace) {
        return Err(ProbeError::EmptyReply(addr));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Full lookup: ask the root server which registry serves the TLD, then ask the registry.
pub async fn lookup(
    root: &str,
    domain: &str,
    follow_referral: bool,
) -> Result<Registration, ProbeError> {
    let tld = domain.rsplit('.').next().unwrap_or(domain);
    let root_reply = query(root, tld).await?;
    let registry = referral(&root_reply, &["refer", "whois"])
        .ok_or_else(|| ProbeError::UnknownTld(tld.to_string()))?;
    tracing::debug!(%domain, %registry, "whois registry");

    let reply = query(&registry, domain).await?;
    if is_not_found(&reply) {
        return Err(ProbeError::NotRegistered(domain.to_string()));
    }
    let mut registration = parse_dates(&reply);

    if follow_referral {
        let registrar = referral(&reply, &["registrar whois server", "whois server"])
            .filter(|r| !r.eq_ignore_ascii_case(&registry));
        if let Some(registrar) = registrar {
            match query(&registrar, domain).await {
                Ok(detail) => registration = registration.merge(parse_dates(&detail)),
                Err(e) => tracing::debug!(%domain, %registrar, error = %e, "registrar whois failed"),
            }
        }
    }
    Ok(registration)
}

fn with_port(server: &str) -> String {
    if server.rsplit_once(':').is_some_and(|(_, p)| p.parse::<u16>().is_ok()) {
        server.to_string()
    } else {
        format!("{}:{}", server, WHOIS_PORT)
    }
}

/// `key: value` pairs, keys lowercased. Comment lines (`%`, `#`, `>>>`) are skipped.
fn fields(reply: &str) -> impl Iterator<Item = (String, &str)> {
    reply.lines().filter_map(|line| {
        let line = line.trim();
        if line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
            return None;
        }
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some((key.trim().to_ascii_lowercase(), value))
    })
}

/// First non-empty value under any of `keys`, stripped of any URL scheme.
pub fn referral(reply: &str, keys: &[&str]) -> Option<String> {
    fields(reply)
        .find(|(k, _)| keys.contains(&k.as_str()))
        .map(|(_, v)| {
            let v = v.split_once("://").map_or(v, |(_, rest)| rest);
            v.trim_end_matches('/').to_string()
        })
        .filter(|v| !v.is_empty())
}

pub fn is_not_found(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m))
}

/// Dates under the known key spellings; the first parseable value of each wins.
pub fn parse_dates(reply: &str) -> Registration {
    let mut out = Registration::default();
    for (key, value) in fields(reply) {
        let key = key.as_str();
        if out.created.is_none() && CREATION_KEYS.contains(&key) {
            out.created = parse_timestamp(value);
        } else if out.expires.is_none() && EXPIRATION_KEYS.contains(&key) {
            out.expires = parse_timestamp(value);
        }
    }
    out
}

/// Calendar date of [`parse_timestamp`].
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|t| t.date())
}

/// Parse the date and time formats registries actually emit.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%a %b %d %H:%M:%S %Y",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    // Trailing timezone names ("2020-01-02 10:00:00 CLST") and free text after the date
    let head = value.split_whitespace().next().unwrap_or(value);
    let head = head.split('T').next().unwrap_or(head);
    for fmt in [
        "%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d-%b-%Y", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d",
    ] {
        if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};

    const VERISIGN: &str = "\
   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
>>> Last update of whois database: 2024-09-01T00:00:00Z <<<
";

    #[test]
    fn verisign_style_reply() {
        let r = parse_dates(VERISIGN);
        assert_eq!(r.created.map(|t| t.date()), NaiveDate::from_ymd_opt(1995, 8, 14));
        assert_eq!(r.created.map(|t| t.hour()), Some(4));
        assert_eq!(r.expires.map(|t| t.date()), NaiveDate::from_ymd_opt(2025, 8, 13));
        assert_eq!(
            referral(VERISIGN, &["registrar whois server"]).as_deref(),
            Some("whois.iana.org")
        );
    }

    #[test]
    fn first_value_is_canonical() {
        let reply = "created: 2001-02-03\ncreated: 2010-01-01\npaid-till: 2030-12-31\n";
        let r = parse_dates(reply);
        assert_eq!(r.created.map(|t| t.date()), NaiveDate::from_ymd_opt(2001, 2, 3));
        assert_eq!(r.expires.map(|t| t.date()), NaiveDate::from_ymd_opt(2030, 12, 31));
    }

    #[test]
    fn unparseable_first_value_does_not_block_later_keys() {
        let reply = "Creation Date: before-the-war\nRegistered on: 05-Mar-2012\n";
        assert_eq!(parse_dates(reply).created.map(|t| t.date()), NaiveDate::from_ymd_opt(2012, 3, 5));
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 2);
        for v in [
            "2020-01-02T10:11:12Z",
            "2020-01-02T10:11:12.0Z",
            "2020-01-02T10:11:12+0000",
            "2020-01-02 10:11:12",
            "2020-01-02 10:11:12 CLST",
            "2020-01-02",
            "2020.01.02",
            "2020/01/02",
            "02-Jan-2020",
            "02.01.2020",
            "20200102",
        ] {
            assert_eq!(parse_date(v), d, "{}", v);
        }
        assert_eq!(parse_date("unknown"), None);
        assert_eq!(
            parse_timestamp("2020-01-02T22:30:00Z").map(|t| t.time()),
            NaiveTime::from_hms_opt(22, 30, 0)
        );
        assert_eq!(
            parse_timestamp("2020-01-02").map(|t| t.time()),
            NaiveTime::from_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn iana_referral() {
        let reply = "% IANA WHOIS server\n\ndomain:       TK\n\nrefer:        whois.dot.tk\n";
        assert_eq!(referral(reply, &["refer", "whois"]).as_deref(), Some("whois.dot.tk"));
        assert_eq!(referral("% nothing here\n", &["refer"]), None);
    }

    #[test]
    fn not_found_detection() {
        assert!(is_not_found("No match for \"NOPE-EXAMPLE.COM\".\n"));
        assert!(is_not_found("Domain Status: free\nStatus: FREE"));
        assert!(!is_not_found(VERISIGN));
    }

    #[test]
    fn port_suffix() {
        assert_eq!(with_port("whois.iana.org"), "whois.iana.org:43");
        assert_eq!(with_port("127.0.0.1:4343"), "127.0.0.1:4343");
    }
}

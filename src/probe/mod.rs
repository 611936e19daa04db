//! Host/registration prober: WHOIS registration dates and DNS presence for the
//! registrable domain. Every lookup is time-bounded and returns a typed error;
//! [`RegistrationInfo::from_lookups`] folds those results into the record's sentinels.

pub mod whois;

pub use whois::Registration;

use crate::config::ProbeConfig;
use chrono::NaiveDateTime;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("lookup disabled")]
    Disabled,
    #[error("no registrable domain")]
    NoRegistrableDomain,
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("whois i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("empty whois reply from {0}")]
    EmptyReply(String),
    #[error("no whois server for tld {0:?}")]
    UnknownTld(String),
    #[error("{0} is not registered")]
    NotRegistered(String),
    #[error("dns: {0}")]
    Dns(#[from] hickory_resolver::error::ResolveError),
}

async fn bounded<T, F>(what: &'static str, limit: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ProbeError::Timeout(what, limit))?
}

/// Shared across URL tasks; holds only configuration and the resolver's cache.
pub struct Prober {
    config: ProbeConfig,
    resolver: TokioAsyncResolver,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = config.dns_timeout();
        opts.attempts = 1;
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
        Self { config, resolver }
    }

    /// WHOIS creation/expiration dates for `domain`.
    pub async fn lookup_whois(&self, domain: Option<&str>) -> Result<Registration, ProbeError> {
        if !self.config.whois_enabled {
            return Err(ProbeError::Disabled);
        }
        let domain = domain.ok_or(ProbeError::NoRegistrableDomain)?;
        bounded(
            "whois",
            self.config.whois_timeout(),
            whois::lookup(&self.config.iana_server, domain, self.config.follow_referral),
        )
        .await
    }

    /// Whether `domain` has at least one A/AAAA record.
    pub async fn resolve(&self, domain: Option<&str>) -> Result<bool, ProbeError> {
        if !self.config.dns_enabled {
            return Err(ProbeError::Disabled);
        }
        let domain = domain.ok_or(ProbeError::NoRegistrableDomain)?;
        bounded("dns", self.config.dns_timeout(), async {
            let lookup = self.resolver.lookup_ip(domain).await?;
            Ok(lookup.iter().next().is_some())
        })
        .await
    }
}

/// Registration fields of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub whois_registered_domain: i64,
    pub dns_record: i64,
    /// Days since creation, or -1
    pub domain_age: i64,
    /// Days between creation and expiration, or -1
    pub domain_registration_length: i64,
}

impl Default for RegistrationInfo {
    fn default() -> Self {
        Self {
            whois_registered_domain: 0,
            dns_record: 0,
            domain_age: -1,
            domain_registration_length: -1,
        }
    }
}

impl RegistrationInfo {
    /// `dns_record` is set by a resolved address or by a WHOIS hit. Day counts are
    /// whole days of the time difference, rounded down.
    pub fn from_lookups(
        whois: &Result<Registration, ProbeError>,
        dns: &Result<bool, ProbeError>,
        now: NaiveDateTime,
    ) -> Self {
        let mut info = Self::default();
        if let Ok(reg) = whois {
            info.whois_registered_domain = 1;
            if let Some(created) = reg.created {
                info.domain_age = (now - created).num_days().max(0);
                if let Some(expires) = reg.expires {
                    info.domain_registration_length = (expires - created).num_days().max(0);
                }
            }
        }
        let resolved = matches!(dns, Ok(true));
        info.dns_record = (resolved || info.whois_registered_domain == 1) as i64;
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        at(y, m, d, 0, 0)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn failed_lookups_give_sentinels() {
        let info = RegistrationInfo::from_lookups(
            &Err(ProbeError::UnknownTld("zz".into())),
            &Err(ProbeError::Disabled),
            day(2024, 1, 1),
        );
        assert_eq!(info, RegistrationInfo::default());
        assert_eq!(info.domain_age, -1);
        assert_eq!(info.domain_registration_length, -1);
        assert_eq!(info.whois_registered_domain, 0);
        assert_eq!(info.dns_record, 0);
    }

    #[test]
    fn day_counts_from_dates() {
        let reg = Registration {
            created: Some(day(2020, 1, 1)),
            expires: Some(day(2021, 1, 1)),
        };
        let info = RegistrationInfo::from_lookups(&Ok(reg), &Ok(false), day(2020, 3, 1));
        assert_eq!(info.whois_registered_domain, 1);
        assert_eq!(info.dns_record, 1);
        assert_eq!(info.domain_age, 60);
        assert_eq!(info.domain_registration_length, 366);
    }

    #[test]
    fn missing_dates_keep_sentinels_but_flag_success() {
        let reg = Registration {
            created: None,
            expires: Some(day(2030, 1, 1)),
        };
        let info = RegistrationInfo::from_lookups(&Ok(reg), &Err(ProbeError::Disabled), day(2024, 1, 1));
        assert_eq!(info.whois_registered_domain, 1);
        assert_eq!(info.domain_age, -1);
        assert_eq!(info.domain_registration_length, -1);
    }

    #[test]
    fn dns_alone_sets_dns_record() {
        let info = RegistrationInfo::from_lookups(
            &Err(ProbeError::NotRegistered("x.com".into())),
            &Ok(true),
            day(2024, 1, 1),
        );
        assert_eq!(info.dns_record, 1);
        assert_eq!(info.whois_registered_domain, 0);
        assert_eq!(info.domain_age, -1);
    }

    #[test]
    fn partial_days_round_down() {
        let reg = Registration {
            created: Some(at(2020, 1, 1, 23, 0)),
            expires: Some(at(2021, 1, 1, 22, 0)),
        };
        let info = RegistrationInfo::from_lookups(&Ok(reg), &Ok(true), at(2020, 1, 11, 9, 0));
        assert_eq!(info.domain_age, 9);
        assert_eq!(info.domain_registration_length, 365);
    }

    #[test]
    fn future_creation_is_clamped() {
        let reg = Registration {
            created: Some(day(2025, 1, 1)),
            expires: None,
        };
        let info = RegistrationInfo::from_lookups(&Ok(reg), &Ok(true), day(2024, 1, 1));
        assert_eq!(info.domain_age, 0);
    }

    #[tokio::test]
    async fn disabled_lookups_fail_fast() {
        let mut config = ProbeConfig::default();
        config.whois_enabled = false;
        config.dns_enabled = false;
        let prober = Prober::new(config);
        assert!(matches!(prober.lookup_whois(Some("example.com")).await, Err(ProbeError::Disabled)));
        assert!(matches!(prober.resolve(Some("example.com")).await, Err(ProbeError::Disabled)));
    }

    #[tokio::test]
    async fn missing_domain_is_an_error() {
        let prober = Prober::new(ProbeConfig::default());
        assert!(matches!(
            prober.lookup_whois(None).await,
            Err(ProbeError::NoRegistrableDomain)
        ));
        assert!(matches!(
            prober.resolve(None).await,
            Err(ProbeError::NoRegistrableDomain)
        ));
    }
}

//! Feature extraction pipeline: URL → lexical analysis → (registration probe ‖ page fetch)
//! → one complete [`FeatureRecord`]. Nothing in here returns an error to the caller.

use super::{FeatureRecord, LexicalFeatures};
use crate::config::{BatchConfig, ExtractorConfig, KeywordLists};
use crate::content::{ContentAnalyzer, ContentFeatures, FetchError};
use crate::probe::{Prober, ProbeError, RegistrationInfo};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Analyzer that could not determine its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Whois,
    Dns,
    Content,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Whois => "whois",
            Stage::Dns => "dns",
            Stage::Content => "content",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

/// A record plus the stages whose fields are sentinels rather than measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub record: FeatureRecord,
    pub failures: Vec<StageFailure>,
}

impl Extraction {
    pub fn degraded(&self, stage: Stage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }
}

/// Merge the three sub-records into the fixed schema.
pub fn assemble(
    lex: &LexicalFeatures,
    reg: &RegistrationInfo,
    content: &ContentFeatures,
) -> FeatureRecord {
    let c = |ch| lex.char_count(ch);
    FeatureRecord {
        url: lex.url.clone(),
        length_url: lex.length_url,
        length_hostname: lex.length_hostname,
        ip: lex.ip,
        nb_dots: c('.'),
        nb_hyphens: c('-'),
        nb_at: c('@'),
        nb_qm: c('?'),
        nb_and: c('&'),
        nb_or: c('|'),
        nb_eq: c('='),
        nb_underscore: c('_'),
        nb_tilde: c('~'),
        nb_percent: c('%'),
        nb_slash: c('/'),
        nb_star: c('*'),
        nb_colon: c(':'),
        nb_comma: c(','),
        nb_semicolumn: c(';'),
        nb_dollar: c('$'),
        nb_space: c(' '),
        nb_www: lex.nb_www,
        nb_com: lex.nb_com,
        nb_dslash: lex.nb_dslash,
        http_in_path: lex.http_in_path,
        https_token: lex.https_token,
        ratio_digits_url: lex.ratio_digits_url,
        ratio_digits_host: lex.ratio_digits_host,
        punycode: lex.punycode,
        port: lex.port,
        tld_in_path: lex.tld_in_path,
        tld_in_subdomain: lex.tld_in_subdomain,
        abnormal_subdomain: lex.abnormal_subdomain,
        nb_subdomains: lex.nb_subdomains,
        prefix_suffix: lex.prefix_suffix,
        random_domain: lex.random_domain,
        shortening_service: lex.shortening_service,
        path_extension: lex.path_extension.clone(),
        nb_redirection: 0,
        nb_external_redirection: 0,
        length_words_raw: lex.raw_words.count,
        char_repeat: lex.char_repeat,
        shortest_words_raw: lex.raw_words.shortest,
        longest_words_raw: lex.raw_words.longest,
        avg_words_raw: lex.raw_words.average,
        shortest_word_host: lex.host_words.shortest,
        longest_word_host: lex.host_words.longest,
        avg_word_host: lex.host_words.average,
        shortest_word_path: lex.path_words.shortest,
        longest_word_path: lex.path_words.longest,
        avg_word_path: lex.path_words.average,
        phish_hints: lex.phish_hints,
        domain_in_brand: lex.domain_in_brand,
        brand_in_subdomain: lex.brand_in_subdomain,
        brand_in_path: lex.brand_in_path,
        suspecious_tld: lex.suspecious_tld,
        statistical_report: 0,
        nb_hyperlinks: content.nb_hyperlinks,
        ratio_int_hyperlinks: content.ratio_int_hyperlinks,
        ratio_ext_hyperlinks: content.ratio_ext_hyperlinks,
        ratio_null_hyperlinks: content.ratio_null_hyperlinks,
        nb_ext_css: content.nb_ext_css,
        ratio_int_redirection: 0.0,
        ratio_ext_redirection: 0.0,
        ratio_int_errors: 0.0,
        ratio_ext_errors: 0.0,
        login_form: content.login_form,
        external_favicon: content.external_favicon,
        links_in_tags: content.links_in_tags,
        submit_email: content.submit_email,
        ratio_int_media: 0.0,
        ratio_ext_media: 0.0,
        sfh: content.sfh,
        iframe: content.iframe,
        popup_window: 0,
        safe_anchor: content.safe_anchor,
        onmouseover: content.onmouseover,
        right_clic: content.right_clic,
        empty_title: content.empty_title,
        domain_in_title: content.domain_in_title,
        domain_with_copyright: content.domain_with_copyright,
        whois_registered_domain: reg.whois_registered_domain,
        domain_registration_length: reg.domain_registration_length,
        domain_age: reg.domain_age,
        web_traffic: 0,
        dns_record: reg.dns_record,
        google_index: 0,
        page_rank: 0,
        status: FeatureRecord::STATUS_UNKNOWN.to_string(),
    }
}

fn record_failure(
    url: &str,
    stage: Stage,
    disabled: bool,
    error: &dyn fmt::Display,
    failures: &mut Vec<StageFailure>,
) {
    let reason = error.to_string();
    if disabled {
        debug!(%url, %stage, "stage disabled");
    } else {
        warn!(%url, %stage, error = %reason, "stage degraded to defaults");
    }
    failures.push(StageFailure { stage, reason });
}

/// Owns the analyzers; shared by reference across concurrent extractions.
pub struct FeatureExtractor {
    lists: KeywordLists,
    batch: BatchConfig,
    prober: Prober,
    content: ContentAnalyzer,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, FetchError> {
        Ok(Self {
            lists: config.keywords.normalized(),
            batch: config.batch,
            prober: Prober::new(config.probe),
            content: ContentAnalyzer::new(config.fetch)?,
        })
    }

    /// Network-free lexical pass only.
    pub fn lexical(&self, url: &str) -> LexicalFeatures {
        LexicalFeatures::analyze(url, &self.lists)
    }

    pub async fn extract(&self, url: &str) -> FeatureRecord {
        self.extract_detailed(url).await.record
    }

    /// Like [`extract`](Self::extract), also reporting which stages fell back to defaults.
    pub async fn extract_detailed(&self, url: &str) -> Extraction {
        let lex = self.lexical(url);
        let registrable = lex.host.registrable();
        let domain = registrable.as_deref();

        let (whois, dns, content) = tokio::join!(
            self.prober.lookup_whois(domain),
            self.prober.resolve(domain),
            self.content.analyze(url, &lex.host.domain),
        );

        let mut failures = Vec::new();
        if let Err(e) = &whois {
            let disabled = matches!(e, ProbeError::Disabled);
            record_failure(url, Stage::Whois, disabled, e, &mut failures);
        }
        if let Err(e) = &dns {
            let disabled = matches!(e, ProbeError::Disabled);
            record_failure(url, Stage::Dns, disabled, e, &mut failures);
        }
        if let Err(e) = &content {
            let disabled = matches!(e, FetchError::Disabled);
            record_failure(url, Stage::Content, disabled, e, &mut failures);
        }

        let reg = RegistrationInfo::from_lookups(&whois, &dns, Utc::now().naive_utc());
        let content = content.unwrap_or_default();
        debug!(%url, degraded = failures.len(), "features extracted");

        Extraction {
            record: assemble(&lex, &reg, &content),
            failures,
        }
    }

    /// Records in input order, up to `batch.concurrency` URLs in flight.
    pub fn extract_stream<'a, I>(&'a self, urls: I) -> impl Stream<Item = FeatureRecord> + 'a
    where
        I: IntoIterator + 'a,
        I::IntoIter: 'a,
        I::Item: AsRef<str> + 'a,
    {
        stream::iter(urls)
            .map(move |u| async move { self.extract(u.as_ref()).await })
            .buffered(self.batch.concurrency.max(1))
    }

    pub async fn extract_batch<I>(&self, urls: I) -> Vec<FeatureRecord>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let urls: Vec<I::Item> = urls.into_iter().collect();
        tracing::info!(count = urls.len(), "batch extraction started");
        let records: Vec<FeatureRecord> = self.extract_stream(urls).collect().await;
        tracing::info!(count = records.len(), "batch extraction finished");
        records
    }
}

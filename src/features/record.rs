//! The fixed-schema feature record. Column names and order are an external contract
//! shared with the classifier and with CSV consumers; they must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of a [`FeatureRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    /// Numeric view; `None` for text cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }
}

impl From<&i64> for FeatureValue {
    fn from(v: &i64) -> Self {
        FeatureValue::Int(*v)
    }
}

impl From<&f64> for FeatureValue {
    fn from(v: &f64) -> Self {
        FeatureValue::Float(*v)
    }
}

impl From<&String> for FeatureValue {
    fn from(v: &String) -> Self {
        FeatureValue::Text(v.clone())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! feature_schema {
    ($( $field:ident : $ty:ty => $column:literal ),+ $(,)?) => {
        /// Feature record for one URL, in column order.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct FeatureRecord {
            $(
                #[serde(rename = $column)]
                pub $field: $ty,
            )+
        }

        impl FeatureRecord {
            /// Column names in schema order.
            pub const COLUMNS: &'static [&'static str] = &[$($column),+];

            /// `(column, value)` pairs in schema order.
            pub fn values(&self) -> Vec<(&'static str, FeatureValue)> {
                vec![$( ($column, FeatureValue::from(&self.$field)) ),+]
            }
        }
    };
}

feature_schema! {
    url: String => "url",
    length_url: i64 => "length_url",
    length_hostname: i64 => "length_hostname",
    ip: i64 => "ip",
    nb_dots: i64 => "nb_dots",
    nb_hyphens: i64 => "nb_hyphens",
    nb_at: i64 => "nb_at",
    nb_qm: i64 => "nb_qm",
    nb_and: i64 => "nb_and",
    nb_or: i64 => "nb_or",
    nb_eq: i64 => "nb_eq",
    nb_underscore: i64 => "nb_underscore",
    nb_tilde: i64 => "nb_tilde",
    nb_percent: i64 => "nb_percent",
    nb_slash: i64 => "nb_slash",
    nb_star: i64 => "nb_star",
    nb_colon: i64 => "nb_colon",
    nb_comma: i64 => "nb_comma",
    nb_semicolumn: i64 => "nb_semicolumn",
    nb_dollar: i64 => "nb_dollar",
    nb_space: i64 => "nb_space",
    nb_www: i64 => "nb_www",
    nb_com: i64 => "nb_com",
    nb_dslash: i64 => "nb_dslash",
    http_in_path: i64 => "http_in_path",
    https_token: i64 => "https_token",
    ratio_digits_url: f64 => "ratio_digits_url",
    ratio_digits_host: f64 => "ratio_digits_host",
    punycode: i64 => "punycode",
    port: i64 => "port",
    tld_in_path: i64 => "tld_in_path",
    tld_in_subdomain: i64 => "tld_in_subdomain",
    abnormal_subdomain: i64 => "abnormal_subdomain",
    nb_subdomains: i64 => "nb_subdomains",
    prefix_suffix: i64 => "prefix_suffix",
    random_domain: i64 => "random_domain",
    shortening_service: i64 => "shortening_service",
    path_extension: String => "path_extension",
    nb_redirection: i64 => "nb_redirection",
    nb_external_redirection: i64 => "nb_external_redirection",
    length_words_raw: i64 => "length_words_raw",
    char_repeat: i64 => "char_repeat",
    shortest_words_raw: i64 => "shortest_words_raw",
    longest_words_raw: i64 => "longest_words_raw",
    avg_words_raw: f64 => "avg_words_raw",
    shortest_word_host: i64 => "shortest_word_host",
    longest_word_host: i64 => "longest_word_host",
    avg_word_host: f64 => "avg_word_host",
    shortest_word_path: i64 => "shortest_word_path",
    longest_word_path: i64 => "longest_word_path",
    avg_word_path: f64 => "avg_word_path",
    phish_hints: i64 => "phish_hints",
    domain_in_brand: i64 => "domain_in_brand",
    brand_in_subdomain: i64 => "brand_in_subdomain",
    brand_in_path: i64 => "brand_in_path",
    suspecious_tld: i64 => "suspecious_tld",
    statistical_report: i64 => "statistical_report",
    nb_hyperlinks: i64 => "nb_hyperlinks",
    ratio_int_hyperlinks: f64 => "ratio_intHyperlinks",
    ratio_ext_hyperlinks: f64 => "ratio_extHyperlinks",
    ratio_null_hyperlinks: f64 => "ratio_nullHyperlinks",
    nb_ext_css: i64 => "nb_extCSS",
    ratio_int_redirection: f64 => "ratio_intRedirection",
    ratio_ext_redirection: f64 => "ratio_extRedirection",
    ratio_int_errors: f64 => "ratio_intErrors",
    ratio_ext_errors: f64 => "ratio_extErrors",
    login_form: i64 => "login_form",
    external_favicon: i64 => "external_favicon",
    links_in_tags: i64 => "links_in_tags",
    submit_email: i64 => "submit_email",
    ratio_int_media: f64 => "ratio_intMedia",
    ratio_ext_media: f64 => "ratio_extMedia",
    sfh: i64 => "sfh",
    iframe: i64 => "iframe",
    popup_window: i64 => "popup_window",
    safe_anchor: i64 => "safe_anchor",
    onmouseover: i64 => "onmouseover",
    right_clic: i64 => "right_clic",
    empty_title: i64 => "empty_title",
    domain_in_title: i64 => "domain_in_title",
    domain_with_copyright: i64 => "domain_with_copyright",
    whois_registered_domain: i64 => "whois_registered_domain",
    domain_registration_length: i64 => "domain_registration_length",
    domain_age: i64 => "domain_age",
    web_traffic: i64 => "web_traffic",
    dns_record: i64 => "dns_record",
    google_index: i64 => "google_index",
    page_rank: i64 => "page_rank",
    status: String => "status",
}

impl FeatureRecord {
    /// Label carried by every record; classification happens downstream.
    pub const STATUS_UNKNOWN: &'static str = "unknown";

    /// Number of numeric columns (everything except `url`, `path_extension`, `status`).
    pub const NUMERIC_WIDTH: usize = 86;

    /// Columns holding a ratio in [0, 1].
    pub const RATIO_COLUMNS: &'static [&'static str] = &[
        "ratio_digits_url",
        "ratio_digits_host",
        "ratio_intHyperlinks",
        "ratio_extHyperlinks",
        "ratio_nullHyperlinks",
        "ratio_intRedirection",
        "ratio_extRedirection",
        "ratio_intErrors",
        "ratio_extErrors",
        "ratio_intMedia",
        "ratio_extMedia",
    ];

    pub fn columns() -> &'static [&'static str] {
        Self::COLUMNS
    }

    pub fn get(&self, column: &str) -> Option<FeatureValue> {
        self.values()
            .into_iter()
            .find_map(|(name, value)| (name == column).then_some(value))
    }

    /// Numeric columns as `f32`, in schema order: the classifier's input row.
    pub fn numeric_vector(&self) -> Vec<f32> {
        self.values()
            .iter()
            .filter_map(|(_, v)| v.as_f64())
            .map(|v| v as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pipeline::assemble;
    use crate::features::{ContentFeatures, LexicalFeatures};
    use crate::probe::RegistrationInfo;
    use crate::config::KeywordLists;

    fn sample() -> FeatureRecord {
        let lists = KeywordLists::default().normalized();
        let lex = LexicalFeatures::analyze("http://example.com/a.php?x=1", &lists);
        assemble(&lex, &RegistrationInfo::default(), &ContentFeatures::default())
    }

    #[test]
    fn schema_shape() {
        let cols = FeatureRecord::columns();
        assert_eq!(cols.len(), 89);
        assert_eq!(cols[0], "url");
        assert_eq!(cols[87], "page_rank");
        assert_eq!(cols[88], "status");
        let unique: std::collections::HashSet<_> = cols.iter().collect();
        assert_eq!(unique.len(), cols.len());
    }

    #[test]
    fn values_follow_column_order() {
        let rec = sample();
        let names: Vec<_> = rec.values().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, FeatureRecord::COLUMNS);
    }

    #[test]
    fn numeric_vector_skips_text_columns() {
        let rec = sample();
        let v = rec.numeric_vector();
        assert_eq!(v.len(), FeatureRecord::NUMERIC_WIDTH);
        assert_eq!(v[0], rec.length_url as f32);
    }

    #[test]
    fn json_keys_match_columns() {
        let rec = sample();
        let json = serde_json::to_value(&rec).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 89);
        assert!(obj.contains_key("ratio_intHyperlinks"));
        assert!(obj.contains_key("nb_extCSS"));
        assert_eq!(obj["status"], "unknown");
    }

    #[test]
    fn get_by_column_name() {
        let rec = sample();
        assert_eq!(rec.get("path_extension"), Some(FeatureValue::Text("php".into())));
        assert_eq!(rec.get("domain_age"), Some(FeatureValue::Int(-1)));
        assert_eq!(rec.get("no_such_column"), None);
    }
}

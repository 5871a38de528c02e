//! Request defaults and per-request options.

use std::collections::BTreeMap;

/// Query string parameters, passed to the service verbatim.
pub type QueryParams = BTreeMap<String, String>;

/// Query parameter carrying the credentials document on logon.
pub const XML_DATA_PARAM: &str = "xmlData";

/// Query parameter selecting the response format.
pub const FORMAT_PARAM: &str = "fmt";

/// Redirect ceiling applied when nothing else is configured.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Transport behaviour applied to every request a client builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestDefaults {
    /// Store and replay cookies between requests
    pub cookie_jar: bool,
    /// Accept gzip-compressed responses
    pub compression: bool,
    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            cookie_jar: true,
            compression: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseEncoding {
    /// UTF-8 text; invalid sequences become U+FFFD
    #[default]
    Utf8,
    /// Raw bytes rendered as standard base64 text
    Base64,
    /// Raw bytes, undecoded
    Binary,
}

/// Everything needed to dispatch one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Service URL the resource path is appended to
    pub base_url: String,
    /// Query string parameters
    pub qs: QueryParams,
    /// Cookie jar enabled
    pub jar: bool,
    /// Compression enabled
    pub gzip: bool,
    /// Redirect ceiling
    pub max_redirects: usize,
    /// Body decoding
    pub encoding: ResponseEncoding,
}

impl RequestOptions {
    /// Combine the current defaults with optional query parameters.
    #[must_use]
    pub fn from_defaults(
        base_url: &str,
        defaults: &RequestDefaults,
        qs: Option<&QueryParams>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            qs: qs.cloned().unwrap_or_default(),
            jar: defaults.cookie_jar,
            gzip: defaults.compression,
            max_redirects: defaults.max_redirects,
            encoding: ResponseEncoding::default(),
        }
    }

    /// Override the redirect ceiling for this request only.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: Option<usize>) -> Self {
        if let Some(max) = max_redirects {
            self.max_redirects = max;
        }
        self
    }

    /// Set the body decoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Whether the `fmt` query parameter asks for CSV.
    #[must_use]
    pub fn requests_csv(&self) -> bool {
        self.qs
            .get(FORMAT_PARAM)
            .is_some_and(|fmt| fmt.eq_ignore_ascii_case("CSV"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let defaults = RequestDefaults::default();
        assert!(defaults.cookie_jar);
        assert!(defaults.compression);
        assert_eq!(defaults.max_redirects, 10);
    }

    #[test]
    fn options_carry_defaults_and_query() {
        let defaults = RequestDefaults {
            cookie_jar: false,
            compression: true,
            max_redirects: 3,
        };
        let qs = QueryParams::from([("a".to_string(), "1".to_string())]);
        let options = RequestOptions::from_defaults("http://localhost", &defaults, Some(&qs));

        assert_eq!(options.base_url, "http://localhost");
        assert_eq!(options.qs, qs);
        assert!(!options.jar);
        assert!(options.gzip);
        assert_eq!(options.max_redirects, 3);
        assert_eq!(options.encoding, ResponseEncoding::Utf8);
    }

    #[test]
    fn options_without_query() {
        let options =
            RequestOptions::from_defaults("http://localhost", &RequestDefaults::default(), None);
        assert!(options.qs.is_empty());
    }

    #[test]
    fn per_request_redirect_override() {
        let options =
            RequestOptions::from_defaults("http://localhost", &RequestDefaults::default(), None);
        assert_eq!(options.clone().with_max_redirects(None).max_redirects, 10);
        assert_eq!(options.with_max_redirects(Some(2)).max_redirects, 2);
    }

    #[test]
    fn csv_detection() {
        let mut qs = QueryParams::new();
        let defaults = RequestDefaults::default();
        assert!(!RequestOptions::from_defaults("", &defaults, Some(&qs)).requests_csv());

        qs.insert(FORMAT_PARAM.to_string(), "csv".to_string());
        assert!(RequestOptions::from_defaults("", &defaults, Some(&qs)).requests_csv());

        qs.insert(FORMAT_PARAM.to_string(), "HTMLFragment".to_string());
        assert!(!RequestOptions::from_defaults("", &defaults, Some(&qs)).requests_csv());
    }
}

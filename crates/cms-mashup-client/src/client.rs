//! Session client for the CMS REST API.
//!
//! Provides logon/logoff and report/export retrieval over one cookie-backed
//! session. Request defaults are read live on every call, so changing them
//! affects the next request only.

use crate::error::CmsError;
use crate::options::{QueryParams, RequestDefaults, RequestOptions, ResponseEncoding, XML_DATA_PARAM};
use crate::response::{sanitize_csv_body, CmsResponse, LogonResponse, ResponseBody};
use crate::session::{parse_logon_body, SessionState};
use crate::transport::Transport;
use cms_mashup_core::{CredentialTemplate, Credentials, OutputFormat, ResourceDescriptor};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// CMS client configuration.
#[derive(Debug, Clone)]
pub struct CmsClientConfig {
    /// Base URL of the service; resource paths are appended to it
    pub service_url: String,
    /// Logon credentials
    pub credentials: Credentials,
    /// Skeleton of the credentials document
    pub credential_template: CredentialTemplate,
    /// Transport-level request timeout
    pub timeout: Duration,
    /// Initial request defaults
    pub defaults: RequestDefaults,
}

impl Default for CmsClientConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost".to_string(),
            credentials: Credentials::default(),
            credential_template: CredentialTemplate::default(),
            timeout: Duration::from_secs(30),
            defaults: RequestDefaults::default(),
        }
    }
}

/// Session-authenticated client.
///
/// All methods take `&self`. Defaults and the session identity sit behind
/// locks that are never held across an `.await`; concurrent logons on one
/// client race and the last one to finish wins.
pub struct SessionClient {
    service_url: String,
    credentials: Credentials,
    credential_template: CredentialTemplate,
    transport: Transport,
    defaults: RwLock<RequestDefaults>,
    session: RwLock<Option<SessionState>>,
}

impl SessionClient {
    /// Create a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if `service_url` is not an absolute http(s) URL.
    pub fn new(
        service_url: impl Into<String>,
        namespace: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CmsError> {
        Self::with_config(CmsClientConfig {
            service_url: service_url.into(),
            credentials: Credentials::new(namespace, username, password),
            ..CmsClientConfig::default()
        })
    }

    /// Create a client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the service URL is not an absolute http(s) URL.
    pub fn with_config(config: CmsClientConfig) -> Result<Self, CmsError> {
        let url = Url::parse(&config.service_url)
            .map_err(|e| CmsError::Init(format!("invalid service URL {}: {e}", config.service_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CmsError::Init(format!(
                "unsupported scheme in service URL: {}",
                url.scheme()
            )));
        }

        Ok(Self {
            service_url: config.service_url,
            credentials: config.credentials,
            credential_template: config.credential_template,
            transport: Transport::new(config.timeout),
            defaults: RwLock::new(config.defaults),
            session: RwLock::new(None),
        })
    }

    /// Base URL of the service.
    #[must_use]
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Logon credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current request defaults.
    #[must_use]
    pub fn defaults(&self) -> RequestDefaults {
        *self.defaults.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the request defaults.
    pub fn set_defaults(&self, defaults: RequestDefaults) {
        *self.defaults.write().unwrap_or_else(PoisonError::into_inner) = defaults;
    }

    /// Modify the request defaults in place.
    pub fn update_defaults(&self, update: impl FnOnce(&mut RequestDefaults)) {
        let mut defaults = self.defaults.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut *defaults);
    }

    /// Identity of the last successful logon, if the last logon succeeded.
    ///
    /// `logoff` leaves this untouched.
    #[must_use]
    pub fn session(&self) -> Option<SessionState> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a session identity is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Credentials document sent with logon.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials template cannot be rendered.
    pub fn build_credentials_xml(&self) -> Result<String, CmsError> {
        Ok(self.credential_template.render(&self.credentials)?)
    }

    /// Request options built from the current defaults.
    #[must_use]
    pub fn options(&self, qs: Option<&QueryParams>) -> RequestOptions {
        RequestOptions::from_defaults(&self.service_url, &self.defaults(), qs)
    }

    /// Request options for an export in `format`.
    ///
    /// Binary spreadsheet formats request a base64 body.
    #[must_use]
    pub fn export_options(
        &self,
        qs: &QueryParams,
        format: OutputFormat,
        max_redirects: Option<usize>,
    ) -> RequestOptions {
        let options = self.options(Some(qs)).with_max_redirects(max_redirects);
        if format.is_binary_spreadsheet() {
            options.with_encoding(ResponseEncoding::Base64)
        } else {
            options
        }
    }

    /// Issue a GET for `path` below the service URL.
    ///
    /// Any status code resolves; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the body cannot be read.
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<CmsResponse, CmsError> {
        let url = format!("{}{}", options.base_url.trim_end_matches('/'), path);
        let client = self.transport.client(options)?;

        tracing::debug!(
            url,
            max_redirects = options.max_redirects,
            encoding = ?options.encoding,
            "GET"
        );

        let response = client
            .get(&url)
            .query(&options.qs)
            .send()
            .await
            .map_err(|e| CmsError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CmsError::Transport(e.to_string()))?;

        Ok(CmsResponse {
            status,
            url: final_url,
            headers,
            body: ResponseBody::decode(&bytes, options.encoding),
        })
    }

    /// Log on and store the session identity.
    ///
    /// Refused credentials resolve with `session: None` and the service's
    /// error document in the body.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or if the body is not well-formed XML.
    pub async fn logon(&self) -> Result<LogonResponse, CmsError> {
        let xml = self.build_credentials_xml()?;
        let qs = QueryParams::from([(XML_DATA_PARAM.to_string(), xml)]);
        let options = self.options(Some(&qs));

        let response = self
            .request(&ResourceDescriptor::logon().path(), &options)
            .await?;

        let session = match response.text() {
            Some(body) => parse_logon_body(body)?,
            None => None,
        };

        tracing::debug!(
            status = response.status,
            authenticated = session.is_some(),
            "Logon completed"
        );

        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();

        Ok(LogonResponse { response, session })
    }

    /// End the server-side session.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    pub async fn logoff(&self) -> Result<CmsResponse, CmsError> {
        let options = self.options(None);
        self.request(&ResourceDescriptor::logoff().path(), &options)
            .await
    }

    /// Run a report and return its HTML.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    pub async fn get_report_by_id(
        &self,
        source_id: &str,
        qs: &QueryParams,
        max_redirects: Option<usize>,
    ) -> Result<CmsResponse, CmsError> {
        let options = self.options(Some(qs)).with_max_redirects(max_redirects);
        self.request(&ResourceDescriptor::report(source_id).path(), &options)
            .await
    }

    /// Run a report and return it in `format`.
    ///
    /// Spreadsheet bodies arrive base64-encoded. CSV bodies, requested either
    /// through `format` or a `fmt=CSV` parameter, have U+FFFD replaced by
    /// U+0000.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    pub async fn get_export_by_id(
        &self,
        source_id: &str,
        qs: &QueryParams,
        format: OutputFormat,
        max_redirects: Option<usize>,
    ) -> Result<CmsResponse, CmsError> {
        let options = self.export_options(qs, format, max_redirects);
        let mut response = self
            .request(&ResourceDescriptor::export(source_id, format).path(), &options)
            .await?;

        if format.is_csv() || options.requests_csv() {
            response.body = sanitize_csv_body(std::mem::take(&mut response.body));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SessionClient {
        SessionClient::new("http://localhost", "NS", "user", "pass").unwrap()
    }

    #[test]
    fn config_default() {
        let config = CmsClientConfig::default();
        assert_eq!(config.service_url, "http://localhost");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.defaults, RequestDefaults::default());
    }

    #[test]
    fn rejects_invalid_service_url() {
        assert!(matches!(
            SessionClient::new("not a url", "NS", "u", "p"),
            Err(CmsError::Init(_))
        ));
        assert!(matches!(
            SessionClient::new("ftp://example.com", "NS", "u", "p"),
            Err(CmsError::Init(_))
        ));
    }

    #[test]
    fn starts_unauthenticated() {
        let client = client();
        assert!(!client.is_authenticated());
        assert_eq!(client.session(), None);
    }

    #[test]
    fn options_reflect_live_defaults() {
        let client = client();
        let before = client.options(None);
        assert_eq!(before.max_redirects, 10);

        client.update_defaults(|d| d.max_redirects = 4);
        let after = client.options(None);

        assert_eq!(before.max_redirects, 10);
        assert_eq!(after.max_redirects, 4);
        assert_eq!(after.base_url, "http://localhost");
        assert!(after.jar);
        assert!(after.gzip);
    }

    #[test]
    fn query_does_not_touch_defaults() {
        let client = client();
        let qs = QueryParams::from([("p_date".to_string(), "2016-04-01".to_string())]);
        let options = client.options(Some(&qs)).with_max_redirects(Some(1));

        assert_eq!(options.qs, qs);
        assert_eq!(options.max_redirects, 1);
        assert_eq!(client.defaults(), RequestDefaults::default());
    }

    #[test]
    fn set_defaults_replaces_everything() {
        let client = client();
        let defaults = RequestDefaults {
            cookie_jar: false,
            compression: false,
            max_redirects: 0,
        };
        client.set_defaults(defaults);
        let options = client.options(None);
        assert!(!options.jar);
        assert!(!options.gzip);
        assert_eq!(options.max_redirects, 0);
    }

    #[test]
    fn export_encoding_by_format() {
        let client = client();
        let qs = QueryParams::new();
        assert_eq!(
            client
                .export_options(&qs, OutputFormat::SpreadsheetMl, None)
                .encoding,
            ResponseEncoding::Base64
        );
        assert_eq!(
            client.export_options(&qs, OutputFormat::Csv, None).encoding,
            ResponseEncoding::Utf8
        );
        assert_eq!(
            client
                .export_options(&qs, OutputFormat::Csv, Some(3))
                .max_redirects,
            3
        );
    }

    #[test]
    fn credentials_xml_uses_client_credentials() {
        let xml = client().build_credentials_xml().unwrap();
        assert!(xml.contains("<name>CAMNamespace</name><value><actualValue>NS</actualValue>"));
        assert!(xml.contains("<name>CAMUsername</name><value><actualValue>user</actualValue>"));
        assert!(xml.contains("<name>CAMPassword</name><value><actualValue>pass</actualValue>"));
    }

    #[test]
    fn broken_template_surfaces_as_credentials_error() {
        let client = SessionClient::with_config(CmsClientConfig {
            credential_template: CredentialTemplate::from_xml("<credentials/>"),
            ..CmsClientConfig::default()
        })
        .unwrap();
        assert!(matches!(
            client.build_credentials_xml(),
            Err(CmsError::Credentials(_))
        ));
    }
}

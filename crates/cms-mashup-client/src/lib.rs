//! # CMS Mashup Client
//!
//! Async client for the Cognos Mashup Service (CMS) REST API.
//!
//! CMS keeps the authenticated session in cookies set by `auth/logon`. A
//! [`SessionClient`] owns a cookie jar and replays those cookies on every
//! later request, so the typical flow is:
//!
//! ```no_run
//! use cms_mashup_client::{QueryParams, SessionClient};
//!
//! # async fn run() -> Result<(), cms_mashup_client::CmsError> {
//! let client = SessionClient::new("http://cognos.example.com/ibmcognos/cgi-bin/cognos.cgi", "LDAP", "jdoe", "secret")?;
//!
//! let logon = client.logon().await?;
//! if logon.session.is_none() {
//!     // Bad credentials resolve normally, the error document is in the body.
//!     eprintln!("{}", logon.response.text().unwrap_or_default());
//! }
//!
//! let params = QueryParams::from([("p_date".to_string(), "2016-04-01".to_string())]);
//! let report = client.get_report_by_id("i1A2B3C", &params, None).await?;
//! println!("{}", report.text().unwrap_or_default());
//!
//! client.logoff().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Only transport failures and unparseable logon responses are errors.
//! Everything the service itself answers, including HTTP error statuses,
//! resolves as a [`CmsResponse`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod options;
pub mod response;
pub mod session;
mod transport;

pub use client::{CmsClientConfig, SessionClient};
pub use error::CmsError;
pub use options::{QueryParams, RequestDefaults, RequestOptions, ResponseEncoding};
pub use response::{sanitize_csv_body, CmsResponse, LogonResponse, ResponseBody};
pub use session::SessionState;

pub use cms_mashup_core::{CredentialTemplate, Credentials, OutputFormat, ResourceDescriptor, Row};

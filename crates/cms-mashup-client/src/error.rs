//! Client error taxonomy.

use cms_mashup_core::CredentialsError;

/// Errors that can occur with the CMS client.
///
/// Service-side failures such as rejected credentials are not errors; they
/// arrive as regular responses carrying the service's error document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CmsError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// Credentials template is malformed or incomplete
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),
    /// Request could not be completed
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

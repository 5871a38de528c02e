//! Response model and post-processing.

use crate::error::CmsError;
use crate::options::ResponseEncoding;
use crate::session::SessionState;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cms_mashup_core::{parse_rows, Row};
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Character the service emits for bytes it cannot encode.
const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Decoded response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body was sent
    #[default]
    Empty,
    /// Text body (UTF-8 or base64, depending on the requested encoding)
    Text(String),
    /// Undecoded bytes
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Decode raw bytes according to `encoding`.
    #[must_use]
    pub fn decode(bytes: &[u8], encoding: ResponseEncoding) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        match encoding {
            ResponseEncoding::Utf8 => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ResponseEncoding::Base64 => Self::Text(STANDARD.encode(bytes)),
            ResponseEncoding::Binary => Self::Binary(bytes.to_vec()),
        }
    }

    /// Text content, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Empty | Self::Binary(_) => None,
        }
    }
}

/// A response from the service.
#[derive(Debug, Clone)]
pub struct CmsResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: ResponseBody,
}

impl CmsResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.body.as_text()
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not text or not valid JSON.
    pub fn json(&self) -> Result<Value, CmsError> {
        let text = self
            .text()
            .ok_or_else(|| CmsError::Parse("response body is not text".to_string()))?;
        serde_json::from_str(text).map_err(|e| CmsError::Parse(e.to_string()))
    }

    /// Parse the body as a tabular report document and flatten it into rows.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not valid JSON.
    pub fn tabular_rows(&self) -> Result<Vec<Row>, CmsError> {
        Ok(parse_rows(&self.json()?))
    }
}

/// Response to `auth/logon` together with the identity it established.
#[derive(Debug, Clone)]
pub struct LogonResponse {
    /// Raw service response
    pub response: CmsResponse,
    /// Identity extracted from the body; `None` when the logon was refused
    pub session: Option<SessionState>,
}

/// Repair CSV exports: every U+FFFD becomes U+0000.
///
/// Empty and binary bodies are returned untouched.
#[must_use]
pub fn sanitize_csv_body(body: ResponseBody) -> ResponseBody {
    match body {
        ResponseBody::Text(text) if text.contains(REPLACEMENT_CHAR) => {
            ResponseBody::Text(text.replace(REPLACEMENT_CHAR, "\0"))
        }
        other => other,
    }
}

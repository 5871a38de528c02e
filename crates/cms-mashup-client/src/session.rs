//! Session identity extracted from logon responses.

use crate::error::CmsError;
use cms_mashup_core::xml_to_json;
use serde_json::Value;

/// Namespace prefix of logon response tags.
const AUTH_PREFIX: &str = "auth:";

/// Identity of an authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// CAM account id, e.g. `CAMID("LDAP:u:uid=jdoe")`
    pub account_id: Option<String>,
    /// Human-readable account name
    pub display_name: Option<String>,
}

/// Drop the first `auth:` prefix from a tag name.
#[must_use]
pub fn strip_auth_prefix(name: &str) -> String {
    name.replacen(AUTH_PREFIX, "", 1)
}

/// Extract the session identity from a logon response body.
///
/// Returns `Ok(None)` for an empty body or any document without
/// `accountInfo/accountID`, such as the service's `<error>` document.
///
/// # Errors
///
/// Returns error if the body is not well-formed XML.
pub fn parse_logon_body(body: &str) -> Result<Option<SessionState>, CmsError> {
    let json = xml_to_json(body, strip_auth_prefix).map_err(|e| CmsError::Parse(e.to_string()))?;

    let account_info = json.get("accountInfo");
    let field = |name: &str| account_info.and_then(|info| info.get(name)).and_then(first_text);

    Ok(field("accountID").map(|account_id| SessionState {
        account_id: Some(account_id),
        display_name: field("displayName"),
    }))
}

fn first_text(value: &Value) -> Option<String> {
    let first = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match first {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("_").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

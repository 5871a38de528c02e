//! Credentials document for `auth/logon`.
//!
//! CMS expects the logon credentials as an XML document passed in the
//! `xmlData` query parameter. The document is produced from a skeleton
//! holding three `credentialElements` entries, located by their `name`
//! child, whose `value/actualValue` receive the namespace, username and
//! password. The skeleton is parsed again for every build, so values from
//! one call can never show up in the next.

use crate::xml::{XmlElement, XmlError};
use std::borrow::Cow;
use std::fmt;

/// Bundled credentials skeleton.
const BUNDLED_SKELETON: &str = include_str!("credentials.xml");

/// Name of the namespace credential element.
pub const CAM_NAMESPACE: &str = "CAMNamespace";
/// Name of the username credential element.
pub const CAM_USERNAME: &str = "CAMUsername";
/// Name of the password credential element.
pub const CAM_PASSWORD: &str = "CAMPassword";

/// Logon credentials for a CMS account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    namespace: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Create a new set of credentials.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Authentication namespace (e.g. an LDAP namespace id).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Skeleton the credentials document is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialTemplate {
    skeleton: Cow<'static, str>,
}

impl Default for CredentialTemplate {
    fn default() -> Self {
        Self::bundled()
    }
}

impl CredentialTemplate {
    /// The skeleton shipped with this crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            skeleton: Cow::Borrowed(BUNDLED_SKELETON),
        }
    }

    /// Use a caller-supplied skeleton.
    ///
    /// The skeleton is only validated when [`render`](Self::render) runs.
    #[must_use]
    pub fn from_xml(skeleton: impl Into<String>) -> Self {
        Self {
            skeleton: Cow::Owned(skeleton.into()),
        }
    }

    /// Build the credentials document for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns error if the skeleton is malformed or lacks one of the
    /// `CAMNamespace`, `CAMUsername` or `CAMPassword` elements.
    pub fn render(&self, credentials: &Credentials) -> Result<String, CredentialsError> {
        let mut root = XmlElement::parse(&self.skeleton)?.ok_or(CredentialsError::EmptyTemplate)?;

        for (name, value) in [
            (CAM_NAMESPACE, credentials.namespace()),
            (CAM_USERNAME, credentials.username()),
            (CAM_PASSWORD, credentials.password()),
        ] {
            actual_value(&mut root, name)?.set_text(value);
        }

        Ok(root.to_xml_string()?)
    }
}

/// Locate `credentialElements[name = target]/value/actualValue`.
fn actual_value<'a>(
    root: &'a mut XmlElement,
    target: &'static str,
) -> Result<&'a mut XmlElement, CredentialsError> {
    root.children_named_mut("credentialElements")
        .find(|element| element.child("name").is_some_and(|n| n.text() == target))
        .and_then(|element| element.child_mut("value"))
        .and_then(|value| value.child_mut("actualValue"))
        .ok_or(CredentialsError::MissingElement(target))
}

/// Build the credentials document from the bundled skeleton.
///
/// # Errors
///
/// Returns error if the bundled skeleton cannot be rendered.
///
/// # Examples
///
/// ```
/// use cms_mashup_core::build_credentials_xml;
///
/// let xml = build_credentials_xml("LDAP", "jdoe", "secret").unwrap();
/// assert!(xml.starts_with("<credentials><credentialElements><name>CAMNamespace</name>"));
/// assert!(xml.contains("<actualValue>jdoe</actualValue>"));
/// ```
pub fn build_credentials_xml(
    namespace: &str,
    username: &str,
    password: &str,
) -> Result<String, CredentialsError> {
    CredentialTemplate::bundled().render(&Credentials::new(namespace, username, password))
}

/// Errors raised by a broken credentials skeleton.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    /// Skeleton is not well-formed XML
    #[error("malformed credentials template: {0}")]
    Template(#[from] XmlError),
    /// Skeleton has no root element
    #[error("credentials template is empty")]
    EmptyTemplate,
    /// A credential element is missing from the skeleton
    #[error("credentials template has no {0} element")]
    MissingElement(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(namespace: &str, username: &str, password: &str) -> String {
        format!(
            "<credentials>\
             <credentialElements><name>CAMNamespace</name><value><actualValue>{namespace}</actualValue></value></credentialElements>\
             <credentialElements><name>CAMUsername</name><value><actualValue>{username}</actualValue></value></credentialElements>\
             <credentialElements><name>CAMPassword</name><value><actualValue>{password}</actualValue></value></credentialElements>\
             </credentials>"
        )
    }

    #[test]
    fn builds_minified_document() {
        let xml = build_credentials_xml("LDAP", "jdoe", "s3cret").unwrap();
        assert_eq!(xml, expected("LDAP", "jdoe", "s3cret"));
        assert!(!xml.starts_with("<?xml"));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn consecutive_builds_do_not_leak() {
        let template = CredentialTemplate::default();
        let first = template
            .render(&Credentials::new("NS1", "alice", "pw-one"))
            .unwrap();
        let second = template
            .render(&Credentials::new("NS2", "bob", "pw-two"))
            .unwrap();

        assert_eq!(first, expected("NS1", "alice", "pw-one"));
        assert_eq!(second, expected("NS2", "bob", "pw-two"));
        assert!(!second.contains("alice"));
        assert!(!second.contains("pw-one"));
    }

    #[test]
    fn values_are_escaped() {
        let xml = build_credentials_xml("NS", "a<b", "p&w").unwrap();
        assert!(xml.contains("<actualValue>a&lt;b</actualValue>"));
        assert!(xml.contains("<actualValue>p&amp;w</actualValue>"));
    }

    #[test]
    fn empty_values_keep_element() {
        let xml = build_credentials_xml("", "", "").unwrap();
        assert_eq!(xml.matches("<actualValue></actualValue>").count(), 3);
    }

    #[test]
    fn custom_template_element_order_is_preserved() {
        let template = CredentialTemplate::from_xml(
            "<credentials>\
             <credentialElements><name>CAMPassword</name><value><actualValue/></value></credentialElements>\
             <credentialElements><name>CAMUsername</name><value><actualValue/></value></credentialElements>\
             <credentialElements><name>CAMNamespace</name><value><actualValue/></value></credentialElements>\
             </credentials>",
        );
        let xml = template.render(&Credentials::new("ns", "u", "p")).unwrap();
        let p = xml.find(">p<").unwrap();
        let u = xml.find(">u<").unwrap();
        let ns = xml.find(">ns<").unwrap();
        assert!(p < u && u < ns);
    }

    #[test]
    fn missing_element_is_an_error() {
        let template = CredentialTemplate::from_xml(
            "<credentials>\
             <credentialElements><name>CAMNamespace</name><value><actualValue/></value></credentialElements>\
             <credentialElements><name>CAMUsername</name><value><actualValue/></value></credentialElements>\
             </credentials>",
        );
        assert_eq!(
            template.render(&Credentials::default()),
            Err(CredentialsError::MissingElement(CAM_PASSWORD))
        );
    }

    #[test]
    fn malformed_template_is_an_error() {
        let template = CredentialTemplate::from_xml("<credentials><credentialElements>");
        assert!(matches!(
            template.render(&Credentials::default()),
            Err(CredentialsError::Template(_))
        ));

        let empty = CredentialTemplate::from_xml("");
        assert_eq!(
            empty.render(&Credentials::default()),
            Err(CredentialsError::EmptyTemplate)
        );
    }

    #[test]
    fn debug_redacts_password() {
        let credentials = Credentials::new("NS", "jdoe", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("jdoe"));
        assert!(!debug.contains("hunter2"));
    }
}

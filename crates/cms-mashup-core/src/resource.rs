//! Resource paths under the `/rds` root.
//!
//! Path structure: `/rds/{resourceType}/{sourceType}[/{sourceId}][/{segment}...]`
//!
//! Segments are joined as given; no escaping or validation takes place.

use crate::format::OutputFormat;
use std::fmt;

/// Root segment of every CMS REST resource.
pub const RESOURCE_ROOT: &str = "rds";

/// Addresses a single CMS resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Resource type (e.g. `auth`, `reportData`, `outputFormat`)
    pub resource_type: String,
    /// Source type (e.g. `logon`, `report`)
    pub source_type: String,
    /// Source identifier, if the resource needs one
    pub source_id: Option<String>,
    /// Trailing segments after the source identifier
    pub segments: Vec<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor without source identifier.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            source_type: source_type.into(),
            source_id: None,
            segments: Vec::new(),
        }
    }

    /// Set the source identifier.
    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Append a trailing segment.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// `auth/logon`
    #[must_use]
    pub fn logon() -> Self {
        Self::new("auth", "logon")
    }

    /// `auth/logoff`
    #[must_use]
    pub fn logoff() -> Self {
        Self::new("auth", "logoff")
    }

    /// `reportData/report/{sourceId}`
    #[must_use]
    pub fn report(source_id: impl Into<String>) -> Self {
        Self::new("reportData", "report").with_source_id(source_id)
    }

    /// `outputFormat/report/{sourceId}/{format}`
    #[must_use]
    pub fn export(source_id: impl Into<String>, format: OutputFormat) -> Self {
        Self::new("outputFormat", "report")
            .with_source_id(source_id)
            .with_segment(format.as_str())
    }

    /// Build the absolute path of this resource.
    ///
    /// An empty source identifier is treated as absent.
    #[must_use]
    pub fn path(&self) -> String {
        let mut parts = vec![
            "",
            RESOURCE_ROOT,
            self.resource_type.as_str(),
            self.source_type.as_str(),
        ];
        if let Some(id) = self.source_id.as_deref().filter(|id| !id.is_empty()) {
            parts.push(id);
        }
        parts.extend(self.segments.iter().map(String::as_str));
        parts.join("/")
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Build a resource path.
///
/// # Examples
///
/// ```
/// use cms_mashup_core::resource_url;
///
/// assert_eq!(resource_url("auth", "logon", None), "/rds/auth/logon");
/// assert_eq!(resource_url("reportData", "report", Some("i1A2")), "/rds/reportData/report/i1A2");
/// ```
#[must_use]
pub fn resource_url(resource_type: &str, source_type: &str, source_id: Option<&str>) -> String {
    let mut descriptor = ResourceDescriptor::new(resource_type, source_type);
    if let Some(id) = source_id {
        descriptor = descriptor.with_source_id(id);
    }
    descriptor.path()
}

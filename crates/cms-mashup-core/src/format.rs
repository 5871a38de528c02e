//! Output formats accepted by the `outputFormat` resource.

use std::fmt;
use std::str::FromStr;

/// Export format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Full HTML page
    Html,
    /// HTML fragment for embedding
    HtmlFragment,
    /// MIME HTML archive
    Mht,
    /// PDF document
    Pdf,
    /// Tab-separated text
    Csv,
    /// Excel 2007 spreadsheet
    SpreadsheetMl,
    /// Excel web archive
    Xlwa,
    /// Report XML
    Xml,
    /// Layout data XML
    LayoutDataXml,
    /// Report data as JSON
    Json,
}

impl OutputFormat {
    /// All known formats.
    pub const ALL: [Self; 10] = [
        Self::Html,
        Self::HtmlFragment,
        Self::Mht,
        Self::Pdf,
        Self::Csv,
        Self::SpreadsheetMl,
        Self::Xlwa,
        Self::Xml,
        Self::LayoutDataXml,
        Self::Json,
    ];

    /// Name used in resource paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::HtmlFragment => "HTMLFragment",
            Self::Mht => "MHT",
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
            Self::SpreadsheetMl => "spreadsheetML",
            Self::Xlwa => "XLWA",
            Self::Xml => "XML",
            Self::LayoutDataXml => "layoutDataXML",
            Self::Json => "JSON",
        }
    }

    /// Binary spreadsheet formats travel base64-encoded.
    #[must_use]
    pub fn is_binary_spreadsheet(self) -> bool {
        matches!(self, Self::SpreadsheetMl | Self::Xlwa)
    }

    /// Whether this is the CSV format.
    #[must_use]
    pub fn is_csv(self) -> bool {
        self == Self::Csv
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormatError;

    /// Case-insensitive match against [`OutputFormat::as_str`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFormatError(s.to_string()))
    }
}

/// The string does not name a known output format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format: {0}")]
pub struct UnknownFormatError(pub String);

//! # CMS Mashup Core
//!
//! I/O-free building blocks for talking to a Cognos Mashup Service (CMS)
//! REST facade.
//!
//! This crate provides:
//! - A minimal XML tree with xml2js-style XML → JSON conversion
//! - The credentials document sent with `auth/logon`
//! - `/rds/...` resource path construction
//! - Flattening of tabular report documents into rows

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod credentials;
pub mod format;
pub mod resource;
pub mod tabular;
pub mod xml;

pub use credentials::{build_credentials_xml, CredentialTemplate, Credentials, CredentialsError};
pub use format::{OutputFormat, UnknownFormatError};
pub use resource::{resource_url, ResourceDescriptor};
pub use tabular::{parse_rows, Row};
pub use xml::{xml_to_json, XmlElement, XmlError, XmlNode};

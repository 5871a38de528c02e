//! CLI configuration.

use anyhow::{Context, Result};
use cms_mashup_client::{CmsClientConfig, Credentials};
use std::time::Duration;

/// Load the client configuration from environment variables.
///
/// # Environment Variables
///
/// - `CMS_SERVICE_URL`: Base URL of the service
/// - `CMS_NAMESPACE`: Authentication namespace
/// - `CMS_USERNAME`: Account username
/// - `CMS_PASSWORD`: Account password
/// - `CMS_TIMEOUT_SECS`: Request timeout in seconds
/// - `CMS_MAX_REDIRECTS`: Redirect ceiling
/// - `CMS_COOKIE_JAR`: `true`/`false`
/// - `CMS_COMPRESSION`: `true`/`false`
///
/// # Errors
///
/// Returns error if a numeric or boolean variable cannot be parsed.
pub fn from_env() -> Result<CmsClientConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Load the client configuration through `lookup`.
///
/// # Errors
///
/// Returns error if a numeric or boolean value cannot be parsed.
pub fn from_lookup<F>(lookup: F) -> Result<CmsClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = CmsClientConfig::default();

    if let Some(url) = lookup("CMS_SERVICE_URL") {
        config.service_url = url;
    }

    config.credentials = Credentials::new(
        lookup("CMS_NAMESPACE").unwrap_or_default(),
        lookup("CMS_USERNAME").unwrap_or_default(),
        lookup("CMS_PASSWORD").unwrap_or_default(),
    );

    if let Some(secs) = lookup("CMS_TIMEOUT_SECS") {
        let secs: u64 = secs.parse().context("Invalid CMS_TIMEOUT_SECS")?;
        config.timeout = Duration::from_secs(secs);
    }

    if let Some(max) = lookup("CMS_MAX_REDIRECTS") {
        config.defaults.max_redirects = max.parse().context("Invalid CMS_MAX_REDIRECTS")?;
    }

    if let Some(flag) = lookup("CMS_COOKIE_JAR") {
        config.defaults.cookie_jar = flag.parse().context("Invalid CMS_COOKIE_JAR")?;
    }

    if let Some(flag) = lookup("CMS_COMPRESSION") {
        config.defaults.compression = flag.parse().context("Invalid CMS_COMPRESSION")?;
    }

    Ok(config)
}

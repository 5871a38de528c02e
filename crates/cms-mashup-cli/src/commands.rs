//! Command implementations.

use anyhow::{bail, Context, Result};
use cms_mashup_client::{
    CmsClientConfig, CmsResponse, OutputFormat, QueryParams, ResponseBody, Row, SessionClient,
};
use cms_mashup_core::{parse_rows, resource_url};
use std::io::Write;
use std::path::Path;

/// Parse `key=value` arguments into query parameters.
///
/// # Errors
///
/// Returns error if an argument has no `=`.
pub fn parse_params(args: &[String]) -> Result<QueryParams> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("Expected key=value, got {arg:?}"))
        })
        .collect()
}

/// Render rows as tab-separated lines.
#[must_use]
pub fn render_rows(rows: &[Row]) -> String {
    rows.iter().map(|row| row.join("\t") + "\n").collect()
}

/// Read a tabular report document from `path` and flatten it.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not JSON.
pub fn rows_from_file(path: &Path) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))?;
    Ok(parse_rows(&document))
}

/// Print the path of a resource.
pub fn url(resource_type: &str, source_type: &str, source_id: Option<&str>) {
    println!("{}", resource_url(resource_type, source_type, source_id));
}

/// Log on, print the session identity and log off again.
///
/// # Errors
///
/// Returns error on transport failure or refused credentials.
pub async fn logon(config: CmsClientConfig) -> Result<()> {
    let client = SessionClient::with_config(config)?;
    authenticate(&client).await?;

    if let Some(session) = client.session() {
        println!("accountID\t{}", session.account_id.unwrap_or_default());
        println!("displayName\t{}", session.display_name.unwrap_or_default());
    }

    client.logoff().await?;
    Ok(())
}

/// Run a report and print its body.
///
/// # Errors
///
/// Returns error on transport failure or refused credentials.
pub async fn report(config: CmsClientConfig, source_id: &str, params: &QueryParams) -> Result<()> {
    let client = SessionClient::with_config(config)?;
    authenticate(&client).await?;

    let response = client.get_report_by_id(source_id, params, None).await?;
    client.logoff().await?;

    write_body(&response)
}

/// Export a report and write its body to stdout.
///
/// # Errors
///
/// Returns error on transport failure or refused credentials.
pub async fn export(
    config: CmsClientConfig,
    source_id: &str,
    format: OutputFormat,
    params: &QueryParams,
) -> Result<()> {
    let client = SessionClient::with_config(config)?;
    authenticate(&client).await?;

    let response = client
        .get_export_by_id(source_id, params, format, None)
        .await?;
    client.logoff().await?;

    write_body(&response)
}

async fn authenticate(client: &SessionClient) -> Result<()> {
    let logon = client.logon().await.context("Logon request failed")?;
    if logon.session.is_none() {
        bail!(
            "Logon refused (status {}): {}",
            logon.response.status,
            logon.response.text().unwrap_or_default()
        );
    }
    tracing::info!(service_url = client.service_url(), "Logged on");
    Ok(())
}

fn write_body(response: &CmsResponse) -> Result<()> {
    if !response.is_success() {
        tracing::warn!(status = response.status, "Service returned an error status");
    }

    let mut stdout = std::io::stdout().lock();
    match &response.body {
        ResponseBody::Empty => {}
        ResponseBody::Text(text) => stdout.write_all(text.as_bytes())?,
        ResponseBody::Binary(bytes) => stdout.write_all(bytes)?,
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn params_from_pairs() {
        let params = parse_params(&strings(&["p_date=2016-04-01", "fmt=CSV", "expr=a=b"])).unwrap();
        assert_eq!(params.get("p_date").map(String::as_str), Some("2016-04-01"));
        assert_eq!(params.get("fmt").map(String::as_str), Some("CSV"));
        assert_eq!(params.get("expr").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn params_require_equals() {
        assert!(parse_params(&strings(&["p_date"])).is_err());
    }

    #[test]
    fn rows_are_tab_separated() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ];
        assert_eq!(render_rows(&rows), "a\tb\n1\t2\n");
        assert_eq!(render_rows(&[]), "");
    }

    #[test]
    fn rows_from_json_file() {
        let document = serde_json::json!({
            "document": {"pages": [{"page": {"body": {"item": [{"lst": {
                "colTitle": [{"item": [{"txt": {"val": "H"}}]}],
                "group": {"row": [{"cell": [{"item": [{"txt": {"val": "v"}}]}]}]}
            }}]}}}]}
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(document.to_string().as_bytes()).unwrap();

        let rows = rows_from_file(file.path()).unwrap();
        assert_eq!(rows, vec![vec!["H".to_string()], vec!["v".to_string()]]);
    }

    #[test]
    fn rows_from_non_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<html/>").unwrap();
        assert!(rows_from_file(file.path()).is_err());
    }
}

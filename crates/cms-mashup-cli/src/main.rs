//! # CMS Mashup CLI
//!
//! Command-line access to a Cognos Mashup Service: log on, fetch reports
//! and exports, and flatten tabular report JSON.

use anyhow::{Context, Result};
use cms_mashup_client::OutputFormat;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so report bodies can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "logon" => {
            commands::logon(config::from_env()?).await?;
        }
        "report" => {
            if args.len() < 3 {
                eprintln!("Usage: cms-mashup report <sourceId> [key=value...]");
                std::process::exit(1);
            }
            let params = commands::parse_params(&args[3..])?;
            commands::report(config::from_env()?, &args[2], &params).await?;
        }
        "export" => {
            if args.len() < 4 {
                eprintln!("Usage: cms-mashup export <sourceId> <format> [key=value...]");
                std::process::exit(1);
            }
            let format: OutputFormat = args[3].parse().context("Invalid output format")?;
            let params = commands::parse_params(&args[4..])?;
            commands::export(config::from_env()?, &args[2], format, &params).await?;
        }
        "rows" => {
            if args.len() < 3 {
                eprintln!("Usage: cms-mashup rows <report.json>");
                std::process::exit(1);
            }
            let rows = commands::rows_from_file(Path::new(&args[2]))?;
            print!("{}", commands::render_rows(&rows));
        }
        "url" => {
            if args.len() < 4 {
                eprintln!("Usage: cms-mashup url <resourceType> <sourceType> [sourceId]");
                std::process::exit(1);
            }
            commands::url(&args[2], &args[3], args.get(4).map(String::as_str));
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"CMS Mashup CLI

USAGE:
    cms-mashup <COMMAND> [OPTIONS]

COMMANDS:
    logon                                   Log on and print the session identity
    report <sourceId> [key=value...]        Run a report and print its HTML
    export <sourceId> <format> [key=value...]
                                            Export a report (CSV, PDF, spreadsheetML, ...)
    rows <report.json>                      Flatten a tabular report document to TSV
    url <resourceType> <sourceType> [id]    Print a resource path
    help                                    Show this help message

ENVIRONMENT:
    CMS_SERVICE_URL, CMS_NAMESPACE, CMS_USERNAME, CMS_PASSWORD,
    CMS_TIMEOUT_SECS, CMS_MAX_REDIRECTS, CMS_COOKIE_JAR, CMS_COMPRESSION
    RUST_LOG controls log output (default: info)

EXAMPLES:
    cms-mashup report i1A2B3C p_date=2016-04-01
    cms-mashup export i1A2B3C CSV > report.tsv
"#
    );
}

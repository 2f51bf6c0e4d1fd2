//! Dataset browsing command

use anyhow::Result;
use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style};

use crate::client::{ApiClient, DatasetResponse};
use crate::output::{format_cell, print_json, print_warning, OutputFormat};

/// Columns shown when none are requested
const DEFAULT_COLUMNS: usize = 8;

/// Show one page of the sample or full dataset
pub async fn show_dataset(
    client: &ApiClient,
    full: bool,
    page: usize,
    page_size: Option<usize>,
    columns: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut path = format!("dataset?sample={}&page={}", !full, page);
    if let Some(size) = page_size {
        path.push_str(&format!("&page_size={}", size));
    }
    let result: DatasetResponse = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let scope = if full { "full" } else { "sample" };
            println!(
                "{} {} of {} ({} records, {} dataset)",
                "Page".bold(),
                result.page,
                result.total_pages,
                result.total_records,
                scope
            );

            if result.data.is_empty() {
                print_warning("No rows on this page");
                return Ok(());
            }

            let headers = select_columns(&result.data[0], &columns);
            let mut builder = Builder::default();
            builder.push_record(headers.iter().cloned());
            for row in &result.data {
                builder.push_record(
                    headers
                        .iter()
                        .map(|h| row.get(h).map(format_cell).unwrap_or_else(|| "-".to_string())),
                );
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }

    Ok(())
}

/// Requested columns that exist, or the first few columns of the row
fn select_columns(row: &Map<String, Value>, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return row.keys().take(DEFAULT_COLUMNS).cloned().collect();
    }
    requested
        .iter()
        .filter(|c| row.contains_key(c.as_str()))
        .cloned()
        .collect()
}

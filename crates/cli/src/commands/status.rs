//! Service status commands: health, info and stats

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, ApiInfo, HealthResponse, StatsResponse};
use crate::output::{
    color_status, format_timestamp, print_json, print_success, print_warning, OutputFormat,
};

/// Row for the models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Type")]
    estimator: String,
    #[tabled(rename = "Estimators")]
    n_estimators: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "SHA-256")]
    sha256: String,
}

/// Row for the training metrics table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Show service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("health").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Status:   {}", color_status(&health.status));
            println!("Version:  {}", health.version);
            if health.models_loaded {
                print_success("Models loaded");
            } else {
                print_warning("Models not loaded; predictions will be rejected");
            }
        }
    }

    Ok(())
}

/// Show service description and model status
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ApiInfo = client.get("info").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{} {}", info.name.bold(), info.version.dimmed());
            println!("{}", info.description);
            println!();

            println!("{}", "Endpoints".bold());
            for (name, path) in &info.endpoints {
                println!("  {:<10} {}", name, path.cyan());
            }
            println!();

            let rows: Vec<ModelRow> = info
                .models
                .iter()
                .map(|(name, model)| ModelRow {
                    name: name.clone(),
                    estimator: model.estimator.clone(),
                    n_estimators: model
                        .n_estimators
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    status: color_status(&model.status),
                    sha256: model
                        .sha256
                        .as_deref()
                        .map(|digest| digest.chars().take(12).collect())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }

    Ok(())
}

/// Show training metadata and recorded model metrics
pub async fn show_stats(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let stats: StatsResponse = client.get("stats").await?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => {
            println!("{}", "Model Statistics".bold());
            println!("{}", "=".repeat(50));
            println!("Dataset:     {}", stats.dataset);
            println!("Task:        {}", stats.task);
            println!("Features:    {}", stats.n_features);
            println!("Trained:     {}", format_timestamp(&stats.created_utc));
            for (split, count) in &stats.n_samples {
                println!("Samples ({}): {}", split, count);
            }
            println!();

            let rows = metric_rows(&stats);
            if rows.is_empty() {
                print_warning("No model metrics recorded");
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
    }

    Ok(())
}

/// Flatten `models.<name>.metrics` into table rows
fn metric_rows(stats: &StatsResponse) -> Vec<MetricRow> {
    let mut rows = Vec::new();
    for (model, summary) in &stats.models {
        let Some(metrics) = summary.get("metrics").and_then(|m| m.as_object()) else {
            continue;
        };
        for (metric, value) in metrics {
            let value = match value.as_f64() {
                Some(v) => format!("{:.4}", v),
                None => value.to_string(),
            };
            rows.push(MetricRow {
                model: model.clone(),
                metric: metric.clone(),
                value,
            });
        }
    }
    rows
}

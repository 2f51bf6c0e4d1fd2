//! Prediction command

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, PredictionOutput};
use crate::output::{
    color_confidence, color_label, format_probability, print_info, print_json, OutputFormat,
};

/// Model variant to run
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModelChoice {
    /// Random forest
    Rf,
    /// Gradient-boosted trees
    Lgbm,
}

impl ModelChoice {
    fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Rf => "rf",
            ModelChoice::Lgbm => "lgbm",
        }
    }
}

/// Row for the explanation table
#[derive(Tabled)]
struct TopFeatureRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Importance")]
    importance: String,
}

/// Parse a `name=value` feature argument
pub fn parse_feature(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("feature '{}' needs a numeric value, got '{}'", name, value))?;
    Ok((name.to_string(), value))
}

/// Build the request body. Values from `--feature` override the file;
/// `model_type` is omitted when no model was chosen so the server default applies.
fn build_payload(
    base: Option<Map<String, Value>>,
    features: &[(String, f64)],
    model: Option<ModelChoice>,
) -> Result<Map<String, Value>> {
    let mut body = base.unwrap_or_default();
    for (name, value) in features {
        let number = serde_json::Number::from_f64(*value)
            .with_context(|| format!("feature '{}' is not finite", name))?;
        body.insert(name.clone(), Value::Number(number));
    }
    if let Some(model) = model {
        body.insert("model_type".to_string(), Value::String(model.as_str().to_string()));
    }
    Ok(body)
}

fn read_features_file(path: &Path) -> Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must contain a JSON object of feature values", path.display()),
    }
}

/// Classify one candidate
pub async fn predict(
    client: &ApiClient,
    model: Option<ModelChoice>,
    features: Vec<(String, f64)>,
    json_file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let base = json_file.map(read_features_file).transpose()?;
    let body = build_payload(base, &features, model)?;

    let result: PredictionOutput = client.post("predict", &body).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Prediction".bold());
            println!("{}", "=".repeat(50));
            println!("Model:             {}", result.model_used.cyan());
            println!(
                "Classification:    {} (class {})",
                color_label(&result.predicted_label),
                result.predicted_class
            );
            println!("Confidence:        {}", color_confidence(result.confidence));
            println!(
                "P(confirmed):      {}",
                format_probability(result.probability_confirmed)
            );
            println!(
                "P(false positive): {}",
                format_probability(result.probability_false_positive)
            );
            println!();

            if result.top_features.is_empty() {
                print_info("No supplied features are known to the model");
            } else {
                let rows: Vec<TopFeatureRow> = result
                    .top_features
                    .iter()
                    .map(|t| TopFeatureRow {
                        feature: t.feature.clone(),
                        value: t.value.to_string(),
                        importance: format!("{:.4}", t.importance),
                    })
                    .collect();
                println!("{}", "Top contributing features".bold());
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
    }

    Ok(())
}

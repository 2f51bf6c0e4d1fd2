//! Fermix CLI
//!
//! A command-line client for the exoplanet classification API: check
//! service health, inspect the trained models, classify candidates and
//! page through the KOI dataset.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{dataset, predict, status};
use std::path::PathBuf;

/// Fermix CLI
#[derive(Parser)]
#[command(name = "fermix")]
#[command(author, version, about = "CLI for the Fermix exoplanet classification API", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via FERMIX_API_URL env var)
    #[arg(long, env = "FERMIX_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check service health and model load state
    Health,

    /// Show service description, endpoints and model status
    Info,

    /// Show training metadata and model metrics
    Stats,

    /// Classify a KOI candidate
    Predict {
        /// Model variant (server default if omitted)
        #[arg(long, short, value_enum)]
        model: Option<predict::ModelChoice>,

        /// Feature value as name=value (repeatable)
        #[arg(long = "feature", short = 'F', value_parser = predict::parse_feature)]
        features: Vec<(String, f64)>,

        /// JSON file with a feature object; --feature values override it
        #[arg(long)]
        json_file: Option<PathBuf>,
    },

    /// Page through the KOI dataset
    Dataset {
        /// Use the full cleaned dataset instead of the sample
        #[arg(long)]
        full: bool,

        /// Page number (1-indexed)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (server default if omitted)
        #[arg(long)]
        page_size: Option<usize>,

        /// Columns to show, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Health => status::show_health(&client, cli.format).await?,
        Commands::Info => status::show_info(&client, cli.format).await?,
        Commands::Stats => status::show_stats(&client, cli.format).await?,
        Commands::Predict {
            model,
            features,
            json_file,
        } => {
            predict::predict(&client, model, features, json_file.as_deref(), cli.format).await?;
        }
        Commands::Dataset {
            full,
            page,
            page_size,
            columns,
        } => {
            dataset::show_dataset(&client, full, page, page_size, columns, cli.format).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_predict_arguments() {
        let cli = Cli::try_parse_from([
            "fermix",
            "predict",
            "--model",
            "rf",
            "-F",
            "koi_period=12.34",
            "--feature",
            "koi_prad=1.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Predict {
                model, features, ..
            } => {
                assert!(matches!(model, Some(predict::ModelChoice::Rf)));
                assert_eq!(features.len(), 2);
                assert_eq!(features[1], ("koi_prad".to_string(), 1.2));
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_rejects_unknown_model() {
        assert!(Cli::try_parse_from(["fermix", "predict", "--model", "xgboost"]).is_err());
    }

    #[test]
    fn test_parse_dataset_columns() {
        let cli = Cli::try_parse_from([
            "fermix",
            "dataset",
            "--full",
            "--columns",
            "kepid,koi_prad",
        ])
        .unwrap();
        match cli.command {
            Commands::Dataset { full, page, columns, .. } => {
                assert!(full);
                assert_eq!(page, 1);
                assert_eq!(columns, vec!["kepid".to_string(), "koi_prad".to_string()]);
            }
            _ => panic!("expected dataset"),
        }
    }
}

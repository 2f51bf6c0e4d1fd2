//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a probability as percentage
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_probability(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a predicted label
pub fn color_label(label: &str) -> String {
    match label {
        "CONFIRMED" => label.green().bold().to_string(),
        "FALSE POSITIVE" => label.red().bold().to_string(),
        _ => label.to_string(),
    }
}

/// Color a model load status
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "loaded" | "ok" => status.green().to_string(),
        "not loaded" => status.red().to_string(),
        _ => status.to_string(),
    }
}

pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

/// Render a JSON cell for a table
pub fn format_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(0.8808), "88.1%");
        assert_eq!(format_probability(0.0), "0.0%");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2025-10-05T12:00:00Z"), "2025-10-05 12:00:00");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!(null)), "-");
        assert_eq!(format_cell(&json!("CONFIRMED")), "CONFIRMED");
        assert_eq!(format_cell(&json!(9.488)), "9.488");
    }
}

//! CLI subcommands and shared helpers.

pub mod batch;
pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use docex_core::{DocexConfig, ExtractionResult};

/// Output format for extraction results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (one row per field)
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docex")
        .join("config.json")
}

/// Load the explicit config file, else the default one, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocexConfig> {
    if let Some(path) = config_path {
        return Ok(DocexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(DocexConfig::from_file(&default_path)?)
    } else {
        Ok(DocexConfig::default())
    }
}

/// Split a comma-separated field list; empty means none.
pub fn parse_expected(expect: Option<&str>) -> Option<Vec<String>> {
    let fields: Vec<String> = expect?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(result.to_json_pretty()?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["name", "value", "confidence", "page"])?;

    for field in &result.fields {
        wtr.write_record([
            field.name.clone(),
            field.value_text().unwrap_or_default(),
            field.confidence.to_string(),
            field.source.page.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document type: {}\n", result.doc_type));
    output.push_str(&format!("Overall confidence: {}\n", result.overall_confidence));
    output.push('\n');

    if result.fields.is_empty() {
        output.push_str("No fields extracted.\n");
    }
    for field in &result.fields {
        let value = field.value_text().unwrap_or_else(|| "-".to_string());
        output.push_str(&format!("  {}: {} ({})\n", field.name, value, field.confidence));
    }

    output.push('\n');
    output.push_str(&format!("Passed rules: {}\n", result.qa.passed_rules.join(", ")));
    output.push_str(&format!("Failed rules: {}\n", result.qa.failed_rules.join(", ")));
    if !result.qa.notes.is_empty() {
        output.push_str(&format!("Notes: {}\n", result.qa.notes));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use docex_core::{DocType, Field};

    #[test]
    fn test_parse_expected() {
        assert_eq!(
            parse_expected(Some(" InvoiceNumber, Date ,,")),
            Some(vec!["InvoiceNumber".to_string(), "Date".to_string()])
        );
        assert_eq!(parse_expected(Some(" , ")), None);
        assert_eq!(parse_expected(None), None);
    }

    #[test]
    fn test_format_csv() {
        let result = ExtractionResult::unscored(
            DocType::Invoice,
            vec![Field::new("Total", Some("1,000".into()), 0.5), Field::new("Date", None, 0.1)],
        );
        let csv = format_result(&result, OutputFormat::Csv).unwrap();
        assert_eq!(csv, "name,value,confidence,page\nTotal,\"1,000\",0.5,\nDate,,0.1,\n");
    }

    #[test]
    fn test_format_text_without_fields() {
        let result = ExtractionResult::unscored(DocType::Prescription, vec![]);
        let text = format_result(&result, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Document type: prescription\n"));
        assert!(text.contains("No fields extracted."));
    }
}

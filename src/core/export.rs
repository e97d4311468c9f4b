use crate::core::results::ResultsReport;
use crate::utils::error::{LookupError, Result};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            _ => Err(LookupError::ValidationError {
                message: format!(
                    "Unsupported export file '{}'. Use a .csv or .json extension",
                    path.display()
                ),
            }),
        }
    }
}

/// One row per record: `section`, then the sorted union of record keys.
pub fn to_csv(report: &ResultsReport) -> Result<String> {
    let columns: BTreeSet<&str> = report
        .sections
        .iter()
        .flat_map(|section| section.records())
        .flat_map(|record| record.primitive_fields().into_keys())
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["section"];
    header.extend(columns.iter().copied());
    writer.write_record(&header)?;

    for section in &report.sections {
        for record in section.records() {
            let fields = record.primitive_fields();
            let mut row = vec![section.title.clone()];
            row.extend(
                columns
                    .iter()
                    .map(|column| fields.get(column).cloned().unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LookupError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LookupError::ValidationError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub fn to_json(report: &ResultsReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_report(report: &ResultsReport, path: &Path) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path)?;
    let content = match format {
        ExportFormat::Csv => to_csv(report)?,
        ExportFormat::Json => to_json(report)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;

    tracing::info!("💾 Results exported to {} ({:?})", path.display(), format);
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::{ResultSection, ResultsView};
    use crate::core::summary::SummaryView;
    use crate::core::Record;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn section(title: &str, view: ResultsView) -> ResultSection {
        ResultSection {
            title: title.to_string(),
            country_code: None,
            hs_codes: Vec::new(),
            sources_searched: None,
            sources_by_country: BTreeMap::new(),
            view,
            summary_attempts: 0,
            summary_trace: Vec::new(),
        }
    }

    fn report() -> ResultsReport {
        ResultsReport {
            query: "laptop".to_string(),
            company: None,
            generated_at: Utc::now(),
            sections: vec![
                section(
                    "Japan",
                    ResultsView::Matches {
                        records: vec![Record::from_value(json!({
                            "hs_code": "8471.30",
                            "description": "Portable, battery powered"
                        }))
                        .unwrap()],
                        summary: SummaryView::Ready {
                            text: "Free".to_string(),
                        },
                    },
                ),
                section("Canada", ResultsView::NoData),
                section(
                    "Mexico",
                    ResultsView::Matches {
                        records: vec![Record::from_value(json!({"tariff_rate": "5%"})).unwrap()],
                        summary: SummaryView::Ready {
                            text: "5%".to_string(),
                        },
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_csv_uses_union_of_columns() {
        let csv = to_csv(&report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "section,description,hs_code,tariff_rate");
        assert_eq!(lines[1], "Japan,\"Portable, battery powered\",8471.30,");
        assert_eq!(lines[2], "Mexico,,,5%");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_report_has_timestamp_and_status() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&report()).unwrap()).unwrap();
        assert!(value["generated_at"].is_string());
        assert_eq!(value["sections"][1]["view"]["status"], "no_data");
        assert_eq!(value["sections"][0]["view"]["summary"]["status"], "ready");
    }

    #[test]
    fn test_write_report_picks_format_from_extension() {
        let temp_dir = TempDir::new().unwrap();
        let csv_path = temp_dir.path().join("out/results.csv");

        assert_eq!(write_report(&report(), &csv_path).unwrap(), ExportFormat::Csv);
        assert!(csv_path.exists());

        let bad_path = temp_dir.path().join("results.xlsx");
        assert!(write_report(&report(), &bad_path).is_err());
    }
}

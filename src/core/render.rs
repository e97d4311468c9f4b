use crate::core::results::{ResultSection, ResultsReport, ResultsView};
use crate::core::summary::SummaryView;
use crate::core::Record;
use std::fmt::Write;

const MAX_LINE_CHARS: usize = 160;

pub fn render_report(report: &ResultsReport, max_rows: usize) -> String {
    let mut out = String::new();
    match &report.company {
        Some(company) => {
            let _ = writeln!(out, "📋 Tariff lookup for {}: \"{}\"", company, report.query);
        }
        None => {
            let _ = writeln!(out, "📋 Tariff lookup: \"{}\"", report.query);
        }
    }

    for section in &report.sections {
        out.push('\n');
        out.push_str(&render_section(section, max_rows));
    }
    out
}

pub fn render_section(section: &ResultSection, max_rows: usize) -> String {
    let mut out = String::new();
    match &section.country_code {
        Some(code) => {
            let _ = writeln!(out, "== {} ({}) ==", section.title, code);
        }
        None => {
            let _ = writeln!(out, "== {} ==", section.title);
        }
    }

    if !section.hs_codes.is_empty() {
        let codes: Vec<&str> = section.hs_codes.iter().map(|m| m.code.as_str()).collect();
        let _ = writeln!(out, "HS code hints: {}", codes.join(", "));
    }

    if let Some(searched) = section.sources_searched {
        let per_country: Vec<String> = section
            .sources_by_country
            .iter()
            .map(|(country, count)| format!("{}: {}", country, count))
            .collect();
        if per_country.is_empty() {
            let _ = writeln!(out, "Sources searched: {}", searched);
        } else {
            let _ = writeln!(
                out,
                "Sources searched: {} ({})",
                searched,
                per_country.join(", ")
            );
        }
    }

    match &section.view {
        ResultsView::NoData => {
            let _ = writeln!(out, "No data found.");
        }
        ResultsView::Error { message } => {
            let _ = writeln!(out, "⚠️ {}", message);
        }
        ResultsView::Matches { records, summary } => {
            if records.is_empty() {
                let _ = writeln!(out, "No matches found.");
            } else {
                let _ = writeln!(out, "Top matches:");
                for (index, record) in records.iter().take(max_rows).enumerate() {
                    let _ = writeln!(out, "  {}. {}", index + 1, record_line(record));
                }
                if records.len() > max_rows {
                    let _ = writeln!(out, "  ... {} more", records.len() - max_rows);
                }
            }
            out.push_str(&render_summary(summary));
        }
    }
    out
}

fn render_summary(summary: &SummaryView) -> String {
    match summary {
        SummaryView::NoMatches | SummaryView::Loading => String::new(),
        SummaryView::Ready { text } => format!("Summary:\n{}\n", indent(text)),
        SummaryView::Manual { text } => format!("Summary (from top match):\n{}\n", indent(text)),
        SummaryView::Degraded { error, fallback } => format!(
            "⚠️ AI summary unavailable: {}\nSummary (from top match):\n{}\n",
            error,
            indent(fallback)
        ),
    }
}

fn record_line(record: &Record) -> String {
    let mut fields: Vec<String> = record
        .primitive_fields()
        .into_iter()
        .filter(|(key, _)| *key != "score")
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    if let Some(score) = record.score() {
        fields.push(format!("score {:.2}", score));
    }

    let line = fields.join("; ");
    if line.chars().count() > MAX_LINE_CHARS {
        let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
        format!("{}...", cut)
    } else {
        line
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

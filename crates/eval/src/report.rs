use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::benchmark::{AnswerRecord, EvaluationReport};

const CSV_HEADER: &str = "Question,Ground Truth,Generated Answer,Score,Latency";

/// Quote a field when it holds a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(records: &[AnswerRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for record in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{:.2}",
            csv_field(&record.question),
            csv_field(&record.ground_truth),
            csv_field(&record.generated_answer),
            record.score,
            record.latency
        );
    }

    out
}

pub fn write_csv(records: &[AnswerRecord], path: &Path) -> Result<()> {
    std::fs::write(path, to_csv(records))
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_json(reports: &[EvaluationReport], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Markdown table comparing the evaluated systems
pub fn markdown_summary(reports: &[EvaluationReport]) -> String {
    let mut out = String::from(
        "# Evaluation Results\n\n\
         | System | Questions | Errors | Avg Score | Median Score | Avg Latency (s) | P95 Latency (s) |\n\
         |--------|-----------|--------|-----------|--------------|-----------------|-----------------|\n",
    );

    for report in reports {
        let s = &report.summary;
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.2}/5 | {:.1} | {:.2} | {:.2} |",
            s.system, s.total_questions, s.errors, s.avg_score, s.median_score, s.avg_latency, s.p95_latency
        );
    }

    out
}

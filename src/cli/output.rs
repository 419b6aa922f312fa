//! Output formatting for CLI

use crate::ingest::IngestReport;

/// Human-readable summary of an ingestion run
pub fn format_ingest_report(report: &IngestReport, container: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n✅ Processed {}\n", report.source));
    output.push_str(&format!("  SHA-256: {}\n", report.sha256));
    output.push_str(&format!("  Rows: {}\n", report.rows));
    output.push_str(&format!("  Diet groups: {}\n", report.diet_groups));
    output.push_str(&format!("  Duration: {} ms\n", report.duration.as_millis()));

    output.push_str(&format!(
        "\nUploaded {} artifact(s) to '{}':\n",
        report.artifacts.len(),
        container
    ));
    for artifact in &report.artifacts {
        output.push_str(&format!("  - {} ({} bytes)\n", artifact.name, artifact.bytes));
    }

    output
}

//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use kshow_lib::Report;
use serde::Deserialize;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Render a report as an aligned table
pub fn render_table(report: &Report) -> String {
    let mut builder = Builder::default();
    builder.push_record(report.columns().iter().map(|c| c.to_string()));
    for row in &report.rows {
        builder.push_record(row.values().map(|v| v.to_string()));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Print reports in the requested format
pub fn print_reports(reports: &[Report], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                if reports.len() > 1 {
                    println!("{}", report.kind.as_str().bold());
                }
                if report.is_empty() {
                    println!("{}", "No items found".yellow());
                    continue;
                }
                println!("{}", render_table(report));
            }
        }
        OutputFormat::Json => {
            let json = match reports {
                [single] => serde_json::to_string_pretty(single)?,
                _ => serde_json::to_string_pretty(reports)?,
            };
            println!("{}", json);
        }
    }
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kshow_lib::{LabelKeys, ReportAssembler, ReportKind, ReportLogger, Snapshot, Workload};

    #[test]
    fn test_render_table_has_headers_and_values() {
        let mut snapshot = Snapshot::empty(Utc::now());
        snapshot.workloads.push(Workload {
            name: "api".into(),
            namespace: "default".into(),
            replicas: 3,
            tolerations: vec![],
        });

        let assembler = ReportAssembler::new(ReportLogger::default(), LabelKeys::default());
        let report = assembler.assemble(ReportKind::WorkloadSummary, &snapshot);
        let table = render_table(&report);

        assert!(table.contains("DEPLOYMENT"));
        assert!(table.contains("REPLICAS"));
        assert!(table.contains("api"));
        assert!(table.contains('3'));
    }
}

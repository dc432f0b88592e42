use scenemend::config::Config;
use scenemend::executor::FileReport;
use scenemend::runner::{read_log, RunSummary, Runner};

use anyhow::Result;

/// Read the log and remediate every file it reports.
pub async fn run(config: &Config, jobs: usize, json: bool) -> Result<()> {
    let runner = Runner::from_config(config)?;
    let text = read_log(config).await?;

    tracing::info!("Remediation run started ({} job(s))", jobs.max(1));
    let summary = runner.run(&text, jobs).await;
    tracing::info!("Remediation run finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// Show what a run would do.
pub async fn plan(config: &Config, json: bool) -> Result<()> {
    let runner = Runner::from_config(config)?;
    let text = read_log(config).await?;
    let index = runner.extract(&text);

    if json {
        let records: Vec<_> = index.iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if index.is_empty() {
        println!("No errors found.");
        return Ok(());
    }

    for (i, record) in index.iter().enumerate() {
        println!("{}. {}", i + 1, record.file_path.display());
        println!("   Cause:   {}", record.cause);
        println!(
            "   Rule:    {}",
            record.rule.as_deref().unwrap_or("(none)")
        );
        println!("   Actions: {}", record.actions);
    }
    println!("\n[PLAN] {} file(s) would be handled", index.len());

    Ok(())
}

fn print_report(report: &FileReport) {
    println!("{} {}", report.outcome, report.path.display());
    for failure in &report.failures {
        println!("    ! {}", failure);
    }
}

fn print_summary(summary: &RunSummary) {
    for report in &summary.reports {
        print_report(report);
    }

    println!();
    println!("Files handled: {}", summary.reports.len());
    for (outcome, count) in summary.counts() {
        println!("  {}: {}", outcome, count);
    }
    let failed = summary.files_with_failures();
    if failed > 0 {
        println!("Files with failed operations: {}", failed);
    }
}

use std::io::{self, Write};

use anyhow::Result;
use procure_review::model::{ComplianceReport, DetectedRisk};
use tracing::info;

use super::{build_reviewer, read_input, write_json_stdout};
use crate::cli::CheckArgs;

pub fn run(args: CheckArgs) -> Result<()> {
    let reviewer = build_reviewer(args.rules_dir.as_deref())?;
    let text = read_input(&args.input)?;

    let report = reviewer.check_compliance(&text, args.category.as_deref());
    info!(
        input = %args.input.display(),
        compliant = report.is_compliant,
        risks = report.risk_count,
        blocking = report.blocking_risks.len(),
        "compliance check completed"
    );

    if args.json {
        write_json_stdout(&report)
    } else {
        write_text_report(&report)
    }
}

fn write_text_report(report: &ComplianceReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let verdict = if report.is_compliant {
        "compliant"
    } else {
        "blocking risks found"
    };
    writeln!(output, "Result: {verdict}")?;
    writeln!(
        output,
        "Risks: {} (P0 {}, P1 {}, P2 {})",
        report.risk_count, report.summary.p0_count, report.summary.p1_count, report.summary.p2_count
    )?;

    write_risks(&mut output, "Blocking", &report.blocking_risks)?;
    write_risks(&mut output, "Warnings", &report.warning_risks)?;

    output.flush()?;
    Ok(())
}

fn write_risks(output: &mut impl Write, heading: &str, risks: &[DetectedRisk]) -> Result<()> {
    if risks.is_empty() {
        return Ok(());
    }

    writeln!(output)?;
    writeln!(output, "{heading}:")?;
    for risk in risks {
        let position = risk
            .position
            .map(|position| format!("@{position}"))
            .unwrap_or_default();
        writeln!(
            output,
            "\t{}\t{}\t\"{}\"{}",
            risk.priority.as_str(),
            risk.detection.as_str(),
            risk.matched,
            position
        )?;
        writeln!(output, "\t\t{}", risk.message)?;
        writeln!(output, "\t\t-> {}", risk.suggestion)?;
    }
    Ok(())
}

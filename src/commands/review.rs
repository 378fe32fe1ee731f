use std::io::{self, Write};

use anyhow::Result;
use procure_review::model::{ReviewMode, ReviewReport};
use procure_review::util::{now_utc_string, sha256_file, write_json_pretty};
use serde::Serialize;
use tracing::{info, warn};

use super::{build_reviewer, read_input, write_json_stdout};
use crate::cli::ReviewArgs;

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ReviewManifest<'a> {
    manifest_version: u32,
    generated_at: String,
    source_path: String,
    source_sha256: String,
    report: &'a ReviewReport,
}

pub fn run(args: ReviewArgs) -> Result<()> {
    let reviewer = build_reviewer(args.rules_dir.as_deref())?;
    let text = read_input(&args.input)?;

    info!(
        input = %args.input.display(),
        category = ?args.category,
        subtype = ?args.subtype,
        "review requested"
    );

    let report = reviewer.review(&text, args.category.as_deref(), args.subtype.as_deref());

    if args.category.is_some() && report.mode == ReviewMode::Generic {
        warn!(category = ?args.category, "no fields configured for category, generic review used");
    }
    info!(
        mode = ?report.mode,
        score = report.completeness_score,
        errors = report.counts.error,
        warnings = report.counts.warning,
        infos = report.counts.info,
        blocking_risks = report.risk_summary.has_blocking_risks,
        "review completed"
    );

    if let Some(output_path) = &args.output {
        let manifest = ReviewManifest {
            manifest_version: MANIFEST_VERSION,
            generated_at: now_utc_string(),
            source_path: args.input.display().to_string(),
            source_sha256: sha256_file(&args.input)?,
            report: &report,
        };
        write_json_pretty(output_path, &manifest)?;
        info!(path = %output_path.display(), "wrote review manifest");
    }

    if args.json {
        write_json_stdout(&report)
    } else {
        write_text_report(&report)
    }
}

fn write_text_report(report: &ReviewReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let mode = match report.mode {
        ReviewMode::Category => "category",
        ReviewMode::Generic => "generic",
    };
    writeln!(output, "Mode: {mode}")?;
    if let Some(category) = &report.category {
        match &report.subtype {
            Some(subtype) => writeln!(output, "Category: {category} ({subtype})")?,
            None => writeln!(output, "Category: {category}")?,
        }
    }
    if let Some(stamp) = &report.ruleset {
        writeln!(
            output,
            "Ruleset: {}",
            stamp.version.as_deref().unwrap_or("(unversioned)")
        )?;
    }
    writeln!(output, "Completeness score: {:.1}", report.completeness_score)?;
    writeln!(
        output,
        "Issues: {} (errors {}, warnings {}, info {})",
        report.counts.total, report.counts.error, report.counts.warning, report.counts.info
    )?;

    if !report.extracted_fields.is_empty() {
        writeln!(output)?;
        writeln!(output, "Extracted fields:")?;
        for (field_id, field) in &report.extracted_fields {
            writeln!(
                output,
                "\t{}\t{}\t{}\tconfidence={:.2}",
                field_id,
                field.label,
                field.value.display(),
                field.confidence
            )?;
        }
    }

    if !report.issues.is_empty() {
        writeln!(output)?;
        writeln!(output, "Issues:")?;
        for issue in &report.issues {
            writeln!(output, "\t[{}] {}", issue.level.as_str(), issue.message)?;
            writeln!(output, "\t\t-> {}", issue.suggestion)?;
        }
    }

    writeln!(output)?;
    writeln!(output, "Suggestions:")?;
    for (index, suggestion) in report.suggestions.iter().enumerate() {
        writeln!(output, "\t{}. {suggestion}", index + 1)?;
    }

    output.flush()?;
    Ok(())
}

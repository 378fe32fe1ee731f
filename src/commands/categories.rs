use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use super::{build_reviewer, write_json_stdout};
use crate::cli::CategoriesArgs;

pub fn run(args: CategoriesArgs) -> Result<()> {
    let reviewer = build_reviewer(args.rules_dir.as_deref())?;
    let categories = reviewer.available_categories();

    if categories.is_empty() {
        warn!("no categories configured");
    }
    info!(
        categories = categories.len(),
        version = reviewer.engine().index_version().unwrap_or("(unversioned)"),
        "listed categories"
    );

    if args.json {
        return write_json_stdout(&categories);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for category in &categories {
        writeln!(output, "{}\t{}\t{}", category.id, category.name, category.description)?;
        for subtype in &category.subtypes {
            writeln!(output, "\t{}\t{}\t{}", subtype.id, subtype.name, subtype.description)?;
        }
    }
    output.flush()?;
    Ok(())
}

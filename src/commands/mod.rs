pub mod categories;
pub mod check;
pub mod fields;
pub mod review;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use procure_review::Reviewer;
use procure_review::rules::{BundledProvider, DirectoryProvider, SchemaProvider};
use serde::Serialize;
use tracing::info;

fn build_reviewer(rules_dir: Option<&Path>) -> Result<Reviewer> {
    let provider: Arc<dyn SchemaProvider> = match rules_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("rules directory not found: {}", dir.display());
            }
            Arc::new(DirectoryProvider::new(dir))
        }
        None => Arc::new(BundledProvider),
    };

    let source = provider.describe();
    let reviewer = Reviewer::new(provider)?;
    info!(
        source = %source,
        lexicon = reviewer.lexicon_version().unwrap_or("(unversioned)"),
        "using rule data"
    );
    Ok(reviewer)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

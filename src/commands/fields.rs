use std::io::{self, Write};

use anyhow::{Result, bail};
use tracing::info;

use super::{build_reviewer, write_json_stdout};
use crate::cli::FieldsArgs;

pub fn run(args: FieldsArgs) -> Result<()> {
    let reviewer = build_reviewer(args.rules_dir.as_deref())?;

    if reviewer.engine().category_info(&args.category).is_none() {
        bail!("unknown category: {}", args.category);
    }

    let fields = reviewer.category_fields(&args.category, args.subtype.as_deref());
    info!(
        category = %args.category,
        subtype = ?args.subtype,
        fields = fields.len(),
        "listed category fields"
    );

    if args.json {
        return write_json_stdout(&fields);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for field in &fields {
        let required = if field.required { "required" } else { "optional" };
        writeln!(
            output,
            "{}\t{}\t{}\t{}\t{}",
            field.field_id,
            field.label,
            field.priority.as_str(),
            field.field_type.as_str(),
            required
        )?;
    }
    output.flush()?;
    Ok(())
}

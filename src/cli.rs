use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "procure-review",
    version,
    about = "Review procurement requirement documents for completeness and directivity risks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Full review: field extraction, validation, risks and scoring.
    Review(ReviewArgs),
    /// Risk compliance check only.
    Check(CheckArgs),
    /// List configured categories and subtypes.
    Categories(CategoriesArgs),
    /// List a category's field definitions.
    Fields(FieldsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub subtype: Option<String>,

    /// Read rule data from this directory instead of the bundled copy.
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Also write a JSON review manifest to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CategoriesArgs {
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FieldsArgs {
    #[arg(long)]
    pub category: String,

    #[arg(long)]
    pub subtype: Option<String>,

    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

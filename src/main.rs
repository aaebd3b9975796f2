use anyhow::Result;
use clap::Parser;
use pdfunite_structure::config::{
    DEFAULT_OUTPUT_PDF, DEFAULT_OUTPUT_PDF_WITH_OUTLINE, DEFAULT_STRUCTURE_FILE,
};
use pdfunite_structure::{MergeConfig, merge_from_structure};
use std::path::PathBuf;

/// Merge the single-page PDFs listed in a JSON structure file into one document, and a second
/// document provided with a ToC (Table of Contents) reflecting the structure.
///
/// The structure file has the shape
/// `{"home": {"title", "file"}, "sections": [{"title", "file", "children": [...]}]}`.
/// Home is the first page and the top bookmark, each section follows with its whole subtree.
/// Both output files are overwritten if present.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON file describing the structure
    #[arg(short, long, default_value = DEFAULT_STRUCTURE_FILE)]
    structure: PathBuf,
    /// Output path of the merged document
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_PDF)]
    output: PathBuf,
    /// Output path of the merged document with bookmarks
    #[arg(short = 'b', long, default_value = DEFAULT_OUTPUT_PDF_WITH_OUTLINE)]
    output_with_outline: PathBuf,
    /// Directory the `file` values are relative to (default: directory of the structure file)
    #[arg(long)]
    source_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Application error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = MergeConfig {
        structure_path: cli.structure,
        output_path: cli.output,
        output_with_outline_path: cli.output_with_outline,
        source_dir: cli.source_dir,
    };

    let summary = merge_from_structure(&config)?;

    println!(
        "Created merged PDF ({} pages): '{}'",
        summary.num_pages,
        config.output_path.display()
    );
    println!(
        "Created merged PDF with bookmarks: '{}'",
        config.output_with_outline_path.display()
    );

    Ok(())
}

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use pdfunite_structure::utils::{generate_fn_structure_with_levels, write_basic_pdf};
use std::path::Path;

/// Generate PDF documents with random content, to try out the merge by hand.
/// The pages have for title the name of the document and the page number.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Desired action
    #[command(subcommand)]
    cmd: ToolCmd,
}

#[derive(Subcommand, Debug)]
enum ToolCmd {
    /// Generate random PDF with basic features
    GenerateRandomPdf {
        /// Output path
        #[arg(short = 'o')]
        output_path: String,
        /// Number of pages of the document
        #[arg(short = 'n', default_value_t = 1)]
        num_pages: u8,
    },
    /// Generate a directory of single-page PDFs and the `structure.json` describing them
    GenerateStructure {
        /// Directory to create
        #[arg(short = 'o')]
        output_dir: String,
        /// Levels of sections below home
        #[arg(short = 'l', default_value_t = 2)]
        num_levels: u8,
        /// Number of top-level sections, also the number of children of every section
        #[arg(short = 's', default_value_t = 3)]
        num_siblings: u8,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error encountered: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        ToolCmd::GenerateRandomPdf {
            output_path,
            num_pages,
        } => generate_basic_pdf_doc(output_path, num_pages),
        ToolCmd::GenerateStructure {
            output_dir,
            num_levels,
            num_siblings,
        } => {
            let identity_function = |n: u8| n;
            let structure = generate_fn_structure_with_levels(
                &output_dir,
                num_levels,
                num_siblings,
                &identity_function,
            )?;
            println!(
                "Structure with {} top-level sections written in '{output_dir}'",
                structure.sections.len()
            );
            Ok(())
        }
    }
}

fn generate_basic_pdf_doc(output_path: impl AsRef<Path>, num_pages: u8) -> Result<()> {
    let output_path = output_path.as_ref();

    if std::fs::exists(output_path)? {
        return Err(anyhow!(
            "A file at location '{}' exists already",
            output_path.display()
        ));
    }

    write_basic_pdf(output_path, num_pages)
}

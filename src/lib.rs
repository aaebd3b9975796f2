pub mod config;
pub mod error;
pub mod merge;
pub mod outline;
pub mod structure;
pub mod utils;

pub use config::MergeConfig;
pub use error::{ConfigurationError, Error, Result};
pub use outline::{OutlineEntry, TocItem};
pub use structure::{Structure, StructureNode};

use log::info;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub entries: Vec<OutlineEntry>,
    pub num_pages: usize,
}

/// Load the structure, then write the plain merge and the merge with outline.
///
/// Both documents are assembled before anything is saved, so a failing entry leaves
/// the outputs untouched. Existing outputs are overwritten.
pub fn merge_from_structure(config: &MergeConfig) -> Result<MergeSummary> {
    let entries = {
        let structure = Structure::load(&config.structure_path)?;
        outline::collect_entries(&structure)?
    };
    let source_dir = config.source_dir();

    info!("Start the plain merging process");
    let mut main_doc = merge::merge_entries(&entries, &source_dir)?;

    info!("Start the merging process with outline");
    let mut main_doc_with_outline = merge::merge_entries_with_outline(&entries, &source_dir)?;

    let num_pages = main_doc.get_pages().len();

    info!("Saving '{}'", config.output_path.display());
    merge::save_document(&mut main_doc, &config.output_path)?;
    info!("Saving '{}'", config.output_with_outline_path.display());
    merge::save_document(&mut main_doc_with_outline, &config.output_with_outline_path)?;

    Ok(MergeSummary { entries, num_pages })
}

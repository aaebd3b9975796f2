//! Locations read and written by a merge run.

use std::path::{Path, PathBuf};

pub const DEFAULT_STRUCTURE_FILE: &str = "structure.json";
pub const DEFAULT_OUTPUT_PDF: &str = "All_In_One.pdf";
pub const DEFAULT_OUTPUT_PDF_WITH_OUTLINE: &str = "All_In_One_With_Bookmarks.pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// JSON structure description.
    pub structure_path: PathBuf,
    /// Merged document without outline.
    pub output_path: PathBuf,
    /// Merged document with the outline attached.
    pub output_with_outline_path: PathBuf,
    /// Directory relative `file` values are resolved against. Defaults to the directory
    /// of the structure file.
    pub source_dir: Option<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            structure_path: PathBuf::from(DEFAULT_STRUCTURE_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PDF),
            output_with_outline_path: PathBuf::from(DEFAULT_OUTPUT_PDF_WITH_OUTLINE),
            source_dir: None,
        }
    }
}

impl MergeConfig {
    /// Default file names, all inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            structure_path: dir.join(DEFAULT_STRUCTURE_FILE),
            output_path: dir.join(DEFAULT_OUTPUT_PDF),
            output_with_outline_path: dir.join(DEFAULT_OUTPUT_PDF_WITH_OUTLINE),
            source_dir: None,
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        match &self.source_dir {
            Some(source_dir) => source_dir.clone(),
            None => self
                .structure_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

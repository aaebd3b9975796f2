//! Flattening of a [`Structure`] into the ordered outline of the merged document.

use crate::error::ConfigurationError;
use crate::structure::{Structure, StructureNode};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

const HOME_LEVEL: usize = 1;
const DEFAULT_HOME_TITLE: &str = "Home";
const DEFAULT_NODE_TITLE: &str = "Untitled";

/// One bookmark of the outline together with the single-page PDF it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: usize,
    pub title: String,
    pub file: PathBuf,
}

/// Row of the table of contents: `(level, title, 1-based page number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    pub level: usize,
    pub title: String,
    pub page: u32,
}

/// Pre-order walk over a structure: home first, then every section followed by its
/// whole subtree, siblings in declared order.
///
/// Yields an error in place of any node that has no `file`.
pub struct Flatten<'a> {
    home: Option<&'a StructureNode>,
    stack: Vec<(usize, std::slice::Iter<'a, StructureNode>)>,
}

/// Start flattening `structure`. Fails up front if there is no home node, or if it is `{}`.
///
/// Only `sections` are walked below home: `children` declared on home are ignored.
pub fn flatten(structure: &Structure) -> Result<Flatten<'_>, ConfigurationError> {
    let home = structure
        .home
        .as_ref()
        .filter(|home| !home.is_empty())
        .ok_or(ConfigurationError::MissingRoot)?;

    Ok(Flatten {
        home: Some(home),
        stack: vec![(HOME_LEVEL + 1, structure.sections.iter())],
    })
}

/// Flatten the whole structure, stopping at the first invalid node.
pub fn collect_entries(structure: &Structure) -> Result<Vec<OutlineEntry>, ConfigurationError> {
    flatten(structure)?.collect()
}

/// Pair each entry with the page it lands on: entry `i` is page `i + 1`.
pub fn table_of_contents(entries: &[OutlineEntry]) -> Vec<TocItem> {
    entries
        .iter()
        .zip(1..)
        .map(|(entry, page)| TocItem {
            level: entry.level,
            title: entry.title.clone(),
            page,
        })
        .collect()
}

impl<'a> Iterator for Flatten<'a> {
    type Item = Result<OutlineEntry, ConfigurationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(home) = self.home.take() {
            return Some(OutlineEntry::from_node(HOME_LEVEL, home, DEFAULT_HOME_TITLE));
        }

        loop {
            let (level, siblings) = self.stack.last_mut()?;
            let level = *level;

            match siblings.next() {
                Some(node) => {
                    if !node.children.is_empty() {
                        self.stack.push((level + 1, node.children.iter()));
                    }
                    return Some(OutlineEntry::from_node(level, node, DEFAULT_NODE_TITLE));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl FusedIterator for Flatten<'_> {}

impl OutlineEntry {
    fn from_node(
        level: usize,
        node: &StructureNode,
        default_title: &str,
    ) -> Result<Self, ConfigurationError> {
        let title = node
            .title
            .clone()
            .unwrap_or_else(|| default_title.to_string());

        match &node.file {
            Some(file) if !file.as_os_str().is_empty() => Ok(OutlineEntry {
                level,
                title,
                file: file.clone(),
            }),
            _ => Err(ConfigurationError::MissingFile { title }),
        }
    }

    /// Path of the source document, relative paths taken from `source_dir`.
    pub fn resolve(&self, source_dir: impl AsRef<Path>) -> PathBuf {
        source_dir.as_ref().join(&self.file)
    }
}

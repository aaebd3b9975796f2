//! The JSON structure description driving the merge.
//!
//! ```json
//! {
//!   "home": { "title": "Home", "file": "home.pdf" },
//!   "sections": [
//!     { "title": "Intro", "file": "intro.pdf", "children": [
//!       { "title": "Motivation", "file": "motivation.pdf" }
//!     ] }
//!   ]
//! }
//! ```

use crate::error::{ConfigurationError, Result};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root of the structure file. The order of the keys in the JSON object is irrelevant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Structure {
    #[serde(default)]
    pub home: Option<StructureNode>,
    #[serde(default)]
    pub sections: Vec<StructureNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructureNode {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub children: Vec<StructureNode>,
}

impl Structure {
    /// Read and parse the structure file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading the structure from '{}'", path.display());

        if !std::fs::exists(path)? {
            return Err(ConfigurationError::StructureNotFound(path.to_path_buf()).into());
        }

        let text = std::fs::read_to_string(path)?;
        let structure = serde_json::from_str::<Structure>(&text).map_err(|source| {
            ConfigurationError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(
            "The structure declares {} top-level sections",
            structure.sections.len()
        );
        Ok(structure)
    }

    /// Parse a structure held in memory, e.g. embedded in a test.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| {
            ConfigurationError::Malformed {
                path: PathBuf::from("<memory>"),
                source,
            }
            .into()
        })
    }
}

impl StructureNode {
    pub fn new(title: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            title: Some(title.into()),
            file: Some(file.into()),
            children: Vec::new(),
        }
    }

    /// True for a node declared as `{}`.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.file.is_none() && self.children.is_empty()
    }

    pub fn with_children(mut self, children: Vec<StructureNode>) -> Self {
        self.children = children;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::utils;
    use anyhow::Result;

    #[test]
    fn parse_nested_sections_in_declared_order() -> Result<()> {
        let structure = Structure::from_json(
            r#"{
                "sections": [
                    {"title": "B", "file": "b.pdf", "children": [
                        {"title": "B2", "file": "b2.pdf"},
                        {"title": "B1", "file": "b1.pdf"}
                    ]},
                    {"title": "A", "file": "a.pdf"}
                ],
                "home": {"title": "Home", "file": "home.pdf"}
            }"#,
        )?;

        let home = structure.home.expect("home is declared");
        assert_eq!(home, StructureNode::new("Home", "home.pdf"));

        let titles: Vec<_> = structure
            .sections
            .iter()
            .map(|node| node.title.clone().unwrap_or_default())
            .collect();
        assert_eq!(titles, ["B", "A"]);

        let children: Vec<_> = structure.sections[0]
            .children
            .iter()
            .map(|node| node.file.clone())
            .collect();
        assert_eq!(
            children,
            [Some(PathBuf::from("b2.pdf")), Some(PathBuf::from("b1.pdf"))]
        );

        Ok(())
    }

    #[test]
    fn null_file_and_missing_title_are_accepted_by_the_parser() -> Result<()> {
        let structure = Structure::from_json(
            r#"{"home": {"file": null}, "sections": [{"file": "x.pdf", "unknown": 3}]}"#,
        )?;

        let home = structure.home.expect("home is declared");
        assert_eq!(home.title, None);
        assert_eq!(home.file, None);
        assert_eq!(structure.sections[0].title, None);

        Ok(())
    }

    #[test]
    fn wrongly_shaped_json_is_malformed() {
        let result = Structure::from_json(r#"{"home": {"title": 3}}"#);

        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::Malformed { .. }))
        ));
    }

    #[test]
    fn load_missing_structure_file() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("load_missing_structure_file")?;

        let result = Structure::load(format!("{test_dir}/structure.json"));

        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::StructureNotFound(_)))
        ));

        Ok(())
    }

    #[test]
    fn load_structure_from_disk() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("load_structure_from_disk")?;
        let structure_path = format!("{test_dir}/structure.json");
        std::fs::write(
            &structure_path,
            r#"{"home": {"title": "Home", "file": "a.pdf"}}"#,
        )?;

        let structure = Structure::load(&structure_path)?;

        assert_eq!(structure.home, Some(StructureNode::new("Home", "a.pdf")));
        assert!(structure.sections.is_empty());

        Ok(())
    }
}

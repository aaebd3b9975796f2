//! Fixture generation and inspection helpers, shared by the tests and the `pdf-fixtures` tool.

use crate::outline::TocItem;
use crate::structure::{Structure, StructureNode};
use anyhow::{Result, anyhow};
use lopdf::{Document, Object, ObjectId, dictionary};
use std::collections::BTreeMap;
use std::path::Path;

#[cfg(test)]
const TEST_DIR: &str = "dev-playground/test";

/// Creates a tree of single-page PDFs in `root_dir` together with the matching
/// `structure.json`, and returns the structure written.
///
/// Below home there are `num_levels` levels of sections. The first level has
/// `num_siblings_this_level` sections, and every section of a level has
/// `siblings_fn(n)` children, `n` being the number of children its parent had.
///
/// Use with caution: if siblings_fn(n):=n, an n-tree with L levels has sum(k=1, k=L) {n^k} sections.
pub fn generate_fn_structure_with_levels(
    root_dir: impl AsRef<Path>,
    num_levels: u8,
    num_siblings_this_level: u8,
    siblings_fn: &impl Fn(u8) -> u8,
) -> Result<Structure> {
    let root_dir = root_dir.as_ref();

    if std::fs::exists(root_dir)? {
        return Err(anyhow!(
            "The path '{}' exists already!",
            root_dir.display()
        ));
    }
    std::fs::create_dir_all(root_dir)?;

    let home_file = "home.pdf";
    write_basic_pdf(root_dir.join(home_file), 1)?;

    let generated = generate_sections(
        root_dir,
        "S",
        num_levels,
        num_siblings_this_level,
        siblings_fn,
    );
    let sections = match generated {
        Ok(sections) => sections,
        Err(err) => {
            // If encountering any error, the function tries to clean up after itself
            std::fs::remove_dir_all(root_dir)?;
            return Err(err);
        }
    };

    let structure = Structure {
        home: Some(StructureNode::new("Home", home_file)),
        sections,
    };
    std::fs::write(
        root_dir.join("structure.json"),
        structure_to_json(&structure).to_string(),
    )?;

    Ok(structure)
}

fn generate_sections(
    root_dir: &Path,
    title_prefix: &str,
    num_levels: u8,
    num_siblings_this_level: u8,
    siblings_fn: &impl Fn(u8) -> u8,
) -> Result<Vec<StructureNode>> {
    if num_levels == 0 {
        return Ok(Vec::new());
    }

    (1..=num_siblings_this_level)
        .map(|sibling| {
            let title = format!("{title_prefix}{sibling}");
            let file = format!("{}.pdf", title.replace('.', "_"));
            write_basic_pdf(root_dir.join(&file), 1)?;

            let children = generate_sections(
                root_dir,
                &format!("{title}."),
                num_levels - 1,
                siblings_fn(num_siblings_this_level),
                siblings_fn,
            )?;
            Ok(StructureNode::new(title, file).with_children(children))
        })
        .collect()
}

/// JSON form of `structure`, as read back by [`Structure::load`].
pub fn structure_to_json(structure: &Structure) -> serde_json::Value {
    fn node_to_json(node: &StructureNode) -> serde_json::Value {
        let mut value = serde_json::json!({
            "title": node.title,
            "file": node.file.as_ref().map(|file| file.to_string_lossy().to_string()),
        });
        if !node.children.is_empty() {
            value["children"] = node.children.iter().map(node_to_json).collect();
        }
        value
    }

    serde_json::json!({
        "home": structure.home.as_ref().map(node_to_json),
        "sections": structure.sections.iter().map(node_to_json).collect::<Vec<_>>(),
    })
}

/// Recreates an empty scratch directory below `dev-playground/test`.
#[cfg(test)]
pub fn get_virgin_test_dir(dir_name: impl AsRef<Path>) -> Result<String> {
    let dir_path = format!("{TEST_DIR}/{}", dir_name.as_ref().display());

    if std::fs::exists(&dir_path)? {
        std::fs::remove_dir_all(&dir_path)?;
    }

    std::fs::create_dir_all(&dir_path)?;
    Ok(dir_path)
}

/// Write a document of `num_pages` random pages to `path`, titled after its filename.
pub fn write_basic_pdf(path: impl AsRef<Path>, num_pages: u8) -> Result<()> {
    let path = path.as_ref();
    let doc_name = path
        .file_name()
        .ok_or(anyhow!(
            "The path '{}' does not contain a filename",
            path.display()
        ))?
        .to_string_lossy()
        .to_string();

    let mut doc = get_basic_pdf_doc(&doc_name, num_pages)?;
    doc.save(path)?;

    Ok(())
}

/// Get a PDF file with minimal features
pub fn get_basic_pdf_doc(doc_name: &str, num_pages: u8) -> Result<Document> {
    if doc_name.contains('/') {
        return Err(anyhow!(
            "The document name provided contains a '/', not allowed!"
        ));
    }

    let mut doc = Document::with_version("1.7");

    let pages_root_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
    });

    let pages_ids: Vec<_> = (1..=num_pages)
        .map(|page_number| {
            append_random_page_to_doc(page_number, num_pages, doc_name, &pages_root_id, &mut doc)
        })
        .collect::<Result<_>>()?;

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => pages_ids.iter().map(|&page_id| page_id.into()).collect::<Vec<_>>(),
        "Count" => num_pages,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };

    doc.objects.insert(pages_root_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_root_id,
    });

    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

fn append_random_page_to_doc(
    page_number: u8,
    total_num_pages: u8,
    doc_name: &str,
    pages_id: &ObjectId,
    doc: &mut Document,
) -> Result<ObjectId> {
    use lopdf::{
        Stream,
        content::{Content, Operation},
    };

    let page_title = format!("Page {page_number} of {total_num_pages}");
    let random_text = craft_random_text_of_len(20);

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![50.into(), 600.into()]),
            Operation::new("TL", vec![50.into()]),
            Operation::new("Tf", vec!["F1".into(), 46.into()]),
            Operation::new("Tj", vec![Object::string_literal(doc_name)]),
            Operation::new("Tf", vec!["F1".into(), 36.into()]),
            Operation::new("'", vec![Object::string_literal(page_title)]),
            Operation::new("Tf", vec!["F1".into(), 20.into()]),
            Operation::new("'", vec![Object::string_literal(random_text)]),
            Operation::new("ET", vec![]),
        ],
    };

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => *pages_id,
        "Contents" => content_id,
    });

    Ok(page_id)
}

pub fn craft_random_text_of_len(char_length: usize) -> String {
    use rand::distr::{Alphanumeric, SampleString};
    Alphanumeric.sample_string(&mut rand::rng(), char_length)
}

/// Decoded content stream of the first page of `doc`.
pub fn first_page_content(doc: &Document) -> Result<Vec<u8>> {
    let first_page_id = *doc
        .get_pages()
        .get(&1)
        .ok_or(anyhow!("The document has 0 pages!"))?;

    Ok(doc.get_page_content(first_page_id)?)
}

/// Read back the outline of `doc` as `(level, title, page)` rows in pre-order,
/// top-level bookmarks being level 1.
pub fn read_outline(doc: &Document) -> Result<Vec<TocItem>> {
    let page_numbers: BTreeMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(page_number, page_id)| (page_id, page_number))
        .collect();

    let outlines_id = doc.catalog()?.get(b"Outlines")?.as_reference()?;
    let outlines = doc.get_dictionary(outlines_id)?;

    let mut toc = Vec::new();
    if let Ok(first) = outlines.get(b"First") {
        read_outline_items(doc, first.as_reference()?, 1, &page_numbers, &mut toc)?;
    }

    Ok(toc)
}

fn read_outline_items(
    doc: &Document,
    first_item_id: ObjectId,
    level: usize,
    page_numbers: &BTreeMap<ObjectId, u32>,
    toc: &mut Vec<TocItem>,
) -> Result<()> {
    let mut next_item_id = Some(first_item_id);

    while let Some(item_id) = next_item_id {
        let item = doc.get_dictionary(item_id)?;

        let title = decode_text_string(item.get(b"Title")?.as_str()?);

        let destination = match item.get(b"Dest") {
            Ok(dest) => follow_reference(doc, dest)?,
            Err(_no_dest) => {
                let action = follow_reference(doc, item.get(b"A")?)?.as_dict()?;
                follow_reference(doc, action.get(b"D")?)?
            }
        };
        let page_id = destination
            .as_array()?
            .first()
            .ok_or(anyhow!("The bookmark '{title}' has an empty destination"))?
            .as_reference()?;
        let page = *page_numbers
            .get(&page_id)
            .ok_or(anyhow!("The bookmark '{title}' points outside of the page tree"))?;

        toc.push(TocItem { level, title, page });

        if let Ok(first_child) = item.get(b"First") {
            read_outline_items(doc, first_child.as_reference()?, level + 1, page_numbers, toc)?;
        }

        next_item_id = item.get(b"Next").and_then(Object::as_reference).ok();
    }

    Ok(())
}

/// The object `object` points to, or `object` itself if it is a direct object.
fn follow_reference<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(object_id) => Ok(doc.get_object(*object_id)?),
        direct => Ok(direct),
    }
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, utf16 @ ..] => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

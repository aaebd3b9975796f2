use crate::error::{Error, Result};
use crate::outline::{OutlineEntry, TocItem};
use lazy_static::lazy_static;
use log::{debug, info, trace, warn};
use lopdf::{Bookmark, Document, Object, ObjectId, dictionary};
use std::path::{Path, PathBuf};

const DEFAULT_TEXT_FORMAT: u32 = 0;
const BLACK_COLOR_RGB: [f32; 3] = [0f32; 3];

lazy_static! {
    static ref CARRIED_CATALOG_CHILDREN: Vec<String> = ["Type", "Version", "Pages", "PageMode"]
        .map(|not_owned| not_owned.to_string())
        .into_iter()
        .collect();
}

/// Concatenate the single page of every entry's document, in order.
///
/// Relative entry files are looked up in `source_dir`. The returned document has no outline.
pub fn merge_entries(entries: &[OutlineEntry], source_dir: impl AsRef<Path>) -> Result<Document> {
    let source_dir = source_dir.as_ref();

    info!("Initialising main document");
    let mut main_doc = Document::with_version("1.7");
    initialise_doc_with_null_pages(&mut main_doc)?;

    info!("Merging {} single-page documents", entries.len());
    for entry in entries {
        let page_id = merge_single_page(&mut main_doc, entry.resolve(source_dir))?;
        debug!("'{}' appended as page object {page_id:?}", entry.title);
    }

    Ok(main_doc)
}

/// Same as [`merge_entries`], then attach the outline built from the entries' levels and titles.
pub fn merge_entries_with_outline(
    entries: &[OutlineEntry],
    source_dir: impl AsRef<Path>,
) -> Result<Document> {
    let mut main_doc = merge_entries(entries, source_dir)?;

    info!("Build the Outline of the main document and append it to the catalog");
    set_toc(&mut main_doc, &crate::outline::table_of_contents(entries))?;

    Ok(main_doc)
}

/// Attach `toc` as the document outline. A row is nested under the closest previous row
/// with a smaller level.
pub fn set_toc(doc: &mut Document, toc: &[TocItem]) -> Result<()> {
    if toc.is_empty() {
        return Ok(());
    }

    let pages = doc.get_pages();
    // (level, bookmark id) of the rows that can still receive children
    let mut open_parents: Vec<(usize, u32)> = Vec::new();

    for item in toc {
        let page_id = *pages.get(&item.page).ok_or(Error::PageNotFound(item.page))?;

        while open_parents
            .last()
            .is_some_and(|&(level, _)| level >= item.level)
        {
            open_parents.pop();
        }
        let parent_bookmark_id = open_parents.last().map(|&(_, id)| id);

        trace!(
            "Bookmark '{}' at level {} pointing to page {}",
            item.title, item.level, item.page
        );
        let bookmark = Bookmark::new(
            item.title.clone(),
            BLACK_COLOR_RGB,
            DEFAULT_TEXT_FORMAT,
            page_id,
        );
        let bookmark_id = doc.add_bookmark(bookmark, parent_bookmark_id);
        open_parents.push((item.level, bookmark_id));
    }

    let outlines_id = doc.build_outline().ok_or(Error::EmptyOutline)?;
    let catalog = doc.catalog_mut()?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    Ok(())
}

/// Compress `doc` and write it to `path`, replacing any existing file.
pub fn save_document(doc: &mut Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if std::fs::exists(path)? {
        debug!("Overwriting '{}'", path.display());
    }

    doc.compress();
    doc.save(path).map_err(|err| Error::Save {
        path: path.to_path_buf(),
        source: err,
    })?;

    Ok(())
}

fn initialise_doc_with_null_pages(doc: &mut Document) -> Result<()> {
    let main_pages_root = dictionary!(
        b"Type" => Object::Name(b"Pages".to_vec()),
        b"Kids" => Object::Array(vec![]),
        b"Count" => Object::Integer(0)
    );

    let main_root_pages_id = doc.add_object(Object::Dictionary(main_pages_root));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(main_root_pages_id)
    });
    doc.trailer.set("Root", catalog_id);

    Ok(())
}

/// Load the document at `path`, check it has exactly one page and append its page tree
/// to the page root of `main_doc`. Returns the id of the appended page.
fn merge_single_page(main_doc: &mut Document, path: PathBuf) -> Result<ObjectId> {
    trace!("Merge the single-page document '{}'", path.display());

    if !std::fs::exists(&path)? {
        return Err(Error::MissingResource { path });
    }

    let mut doc_to_merge = Document::load(&path).map_err(|err| Error::Pdf {
        path: path.clone(),
        source: err,
    })?;

    let pages = doc_to_merge.get_pages();
    if pages.len() != 1 {
        return Err(Error::PageCount {
            path,
            pages: pages.len(),
        });
    }

    for (child_name, _child_object) in doc_to_merge.catalog()?.iter() {
        let child_name = String::from_utf8_lossy(child_name);
        if !CARRIED_CATALOG_CHILDREN.iter().any(|carried| *carried == child_name) {
            warn!(
                "The catalog entry '{child_name}' of '{}' is not carried into the merged document",
                path.display()
            );
        }
    }

    doc_to_merge.renumber_objects_with(main_doc.max_id + 1);
    let imported_max_id = doc_to_merge.max_id;
    let page_id = *doc_to_merge
        .get_pages()
        .get(&1)
        .ok_or(Error::PageNotFound(1))?;

    let main_doc_pages_root_reference = main_doc.catalog()?.get(b"Pages")?.as_reference()?;

    for (object_id, mut object) in doc_to_merge.objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {}
            b"Pages" => {
                let pages_dict = object.as_dict_mut()?;

                if !pages_dict.has(b"Parent") {
                    pages_dict.set(b"Parent", main_doc_pages_root_reference);

                    let imported_pages_count = pages_dict.get(b"Count")?.as_i64()?;
                    let main_doc_pages_root_dictionary = main_doc
                        .get_object_mut(main_doc_pages_root_reference)?
                        .as_dict_mut()?;

                    let actual_count = main_doc_pages_root_dictionary.get(b"Count")?.as_i64()?
                        + imported_pages_count;
                    main_doc_pages_root_dictionary.set(b"Count", Object::Integer(actual_count));
                    main_doc_pages_root_dictionary
                        .get_mut(b"Kids")?
                        .as_array_mut()?
                        .push(Object::Reference(object_id));
                }
                main_doc.objects.insert(object_id, object);
            }
            _ => {
                main_doc.objects.insert(object_id, object);
            }
        }
    }

    main_doc.max_id = main_doc.max_id.max(imported_max_id);

    Ok(page_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::outline::table_of_contents;
    use crate::utils;
    use anyhow::Result;

    fn entry(level: usize, title: &str, file: &str) -> OutlineEntry {
        OutlineEntry {
            level,
            title: title.to_string(),
            file: PathBuf::from(file),
        }
    }

    fn three_single_pages(test_dir: &str) -> Result<Vec<OutlineEntry>> {
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            utils::write_basic_pdf(format!("{test_dir}/{name}"), 1)?;
        }
        Ok(vec![
            entry(1, "Home", "a.pdf"),
            entry(2, "S1", "b.pdf"),
            entry(3, "S1.1", "c.pdf"),
        ])
    }

    #[test]
    fn merge_three_single_pages_in_order() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("merge_three_single_pages_in_order")?;
        let entries = three_single_pages(&test_dir)?;

        let main_doc = merge_entries(&entries, &test_dir)?;

        assert_eq!(main_doc.get_pages().len(), 3);
        assert!(main_doc.catalog()?.get(b"Outlines").is_err());

        let expected_contents = ["a.pdf", "b.pdf", "c.pdf"]
            .iter()
            .map(|name| {
                let source = Document::load(format!("{test_dir}/{name}"))?;
                utils::first_page_content(&source)
            })
            .collect::<Result<Vec<_>>>()?;
        let merged_contents = main_doc
            .get_pages()
            .values()
            .map(|&page_id| main_doc.get_page_content(page_id))
            .collect::<lopdf::Result<Vec<_>>>()?;
        assert_eq!(merged_contents, expected_contents);

        Ok(())
    }

    #[test]
    fn outline_pages_follow_the_entry_positions() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("outline_pages_follow_the_entry_positions")?;
        let entries = three_single_pages(&test_dir)?;
        let output_path = format!("{test_dir}/with_outline.pdf");

        let mut main_doc = merge_entries_with_outline(&entries, &test_dir)?;
        save_document(&mut main_doc, &output_path)?;

        let reloaded = Document::load(&output_path)?;
        assert_eq!(
            utils::read_outline(&reloaded)?,
            table_of_contents(&entries)
        );
        assert_eq!(
            utils::read_outline(&reloaded)?
                .iter()
                .map(|item| item.page)
                .collect::<Vec<_>>(),
            [1, 2, 3]
        );

        Ok(())
    }

    #[test]
    fn sibling_sections_share_the_home_parent() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("sibling_sections_share_the_home_parent")?;
        for name in ["a.pdf", "b.pdf", "c.pdf", "d.pdf"] {
            utils::write_basic_pdf(format!("{test_dir}/{name}"), 1)?;
        }
        let entries = vec![
            entry(1, "Home", "a.pdf"),
            entry(2, "S1", "b.pdf"),
            entry(3, "S1.1", "c.pdf"),
            entry(2, "S2", "d.pdf"),
        ];

        let main_doc = merge_entries_with_outline(&entries, &test_dir)?;

        assert_eq!(utils::read_outline(&main_doc)?, table_of_contents(&entries));

        Ok(())
    }

    #[test]
    fn missing_source_is_a_missing_resource() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("missing_source_is_a_missing_resource")?;
        utils::write_basic_pdf(format!("{test_dir}/a.pdf"), 1)?;
        let entries = vec![entry(1, "Home", "a.pdf"), entry(2, "Gone", "gone.pdf")];

        let result = merge_entries(&entries, &test_dir);

        match result {
            Err(Error::MissingResource { path }) => {
                assert_eq!(path, Path::new(&test_dir).join("gone.pdf"))
            }
            Err(err) => panic!("expected a missing resource error, got '{err}'"),
            Ok(_) => panic!("merging a missing document succeeded"),
        }

        Ok(())
    }

    #[test]
    fn two_pages_source_is_a_page_count_error() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("two_pages_source_is_a_page_count_error")?;
        utils::write_basic_pdf(format!("{test_dir}/a.pdf"), 1)?;
        utils::write_basic_pdf(format!("{test_dir}/b.pdf"), 2)?;
        let entries = vec![entry(1, "Home", "a.pdf"), entry(2, "S1", "b.pdf")];

        let result = merge_entries_with_outline(&entries, &test_dir);

        assert!(matches!(result, Err(Error::PageCount { pages: 2, .. })));

        Ok(())
    }

    #[test]
    fn zero_pages_source_is_a_page_count_error() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("zero_pages_source_is_a_page_count_error")?;
        utils::write_basic_pdf(format!("{test_dir}/a.pdf"), 1)?;
        utils::write_basic_pdf(format!("{test_dir}/z.pdf"), 0)?;
        let entries = vec![entry(1, "Home", "a.pdf"), entry(2, "Empty", "z.pdf")];

        let result = merge_entries(&entries, &test_dir);

        assert!(matches!(result, Err(Error::PageCount { pages: 0, .. })));

        Ok(())
    }

    #[test]
    fn save_into_missing_directory_fails() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("save_into_missing_directory_fails")?;
        let output_path = format!("{test_dir}/not_a_dir/out.pdf");

        let mut doc = utils::get_basic_pdf_doc("doc_name", 1)?;

        assert!(matches!(
            save_document(&mut doc, &output_path),
            Err(Error::Save { .. })
        ));

        Ok(())
    }

    #[test]
    fn non_pdf_source_fails() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("non_pdf_source_fails")?;
        let text_file_path = format!("{test_dir}/text_file.pdf");
        std::fs::write(text_file_path, utils::craft_random_text_of_len(20).as_bytes())?;
        let entries = vec![entry(1, "Home", "text_file.pdf")];

        assert!(matches!(
            merge_entries(&entries, &test_dir),
            Err(Error::Pdf { .. })
        ));

        Ok(())
    }

    #[test]
    fn empty_toc_leaves_the_document_untouched() -> Result<()> {
        let mut doc = utils::get_basic_pdf_doc("doc_name", 2)?;

        set_toc(&mut doc, &[])?;

        assert!(doc.catalog()?.get(b"Outlines").is_err());

        Ok(())
    }

    #[test]
    fn toc_pointing_past_the_last_page_fails() -> Result<()> {
        let mut doc = utils::get_basic_pdf_doc("doc_name", 2)?;
        let toc = [TocItem {
            level: 1,
            title: "Nowhere".to_string(),
            page: 3,
        }];

        assert!(set_toc(&mut doc, &toc).is_err());

        Ok(())
    }

    #[test]
    fn save_document_overwrites_existing_file() -> Result<()> {
        let test_dir = utils::get_virgin_test_dir("save_document_overwrites_existing_file")?;
        let output_path = format!("{test_dir}/out.pdf");
        std::fs::write(&output_path, b"stale")?;

        let mut doc = utils::get_basic_pdf_doc("doc_name", 2)?;
        save_document(&mut doc, &output_path)?;

        assert_eq!(Document::load(&output_path)?.get_pages().len(), 2);

        Ok(())
    }
}

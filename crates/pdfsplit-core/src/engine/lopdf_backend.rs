//! lopdf-backed engine
//!
//! Page copy uses "Construction by Whitelist": only objects reachable from
//! the copied page are cloned into the target, under fresh object ids.

use super::outline;
use super::{PdfEngine, SaveOptions};
use crate::error::{PdfSplitError, Result};
use crate::toc::TocEntry;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page trees deeper than this are treated as malformed
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    type Document = Document;

    fn open(&self, path: &Path) -> Result<Document> {
        if !path.exists() {
            return Err(PdfSplitError::InputNotFound(path.to_path_buf()));
        }
        let doc = Document::load(path)
            .map_err(|e| PdfSplitError::LoadError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), version = %doc.version, "Loaded PDF");
        Ok(doc)
    }

    fn page_count(&self, doc: &Document) -> u32 {
        doc.get_pages().len() as u32
    }

    fn page_text(&self, doc: &Document, index: u32) -> Result<String> {
        doc.extract_text(&[index + 1]).map_err(|e| {
            PdfSplitError::EngineError(format!("Text extraction failed on page {}: {}", index + 1, e))
        })
    }

    fn toc(&self, doc: &Document) -> Result<Vec<TocEntry>> {
        Ok(outline::read_outline(doc))
    }

    fn set_toc(&self, doc: &mut Document, toc: &[TocEntry]) -> Result<()> {
        outline::write_outline(doc, toc)
    }

    fn new_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(0)),
            ("Kids", Object::Array(Vec::new())),
        ]);
        let pages_id = doc.add_object(pages);

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(doc)
    }

    fn copy_pages(&self, target: &mut Document, source: &Document, pages: Range<u32>) -> Result<()> {
        let source_pages = source.get_pages();
        let all_page_ids: HashSet<ObjectId> = source_pages.values().copied().collect();
        let pages_id = pages_root_id(target)?;

        let mut page_ids = Vec::with_capacity(pages.len());
        for index in pages.clone() {
            let page_id = *source_pages.get(&(index + 1)).ok_or_else(|| {
                PdfSplitError::EngineError(format!(
                    "Page {} does not exist (document has {} pages)",
                    index + 1,
                    source_pages.len()
                ))
            })?;
            page_ids.push(page_id);
        }

        let mut copier = PageCopier::new(source, &all_page_ids);
        let new_kids = page_ids
            .into_iter()
            .map(|page_id| copier.copy_page(target, page_id, pages_id).map(Object::Reference))
            .collect::<Result<Vec<_>>>()?;

        append_kids(target, pages_id, new_kids)?;
        debug!(
            start = pages.start,
            end = pages.end,
            objects = copier.id_map.len(),
            "Copied pages"
        );
        Ok(())
    }

    fn save(&self, doc: &mut Document, path: &Path, options: SaveOptions) -> Result<()> {
        if options.garbage_collect {
            let pruned = doc.prune_objects();
            debug!(count = pruned.len(), "Pruned unreferenced objects");
        }
        if options.clean {
            doc.renumber_objects();
        }
        if options.compress {
            doc.compress();
        }

        doc.save(path)
            .map_err(|e| PdfSplitError::EngineError(format!("Save failed for {}: {}", path.display(), e)))?;
        Ok(())
    }

    fn close(&self, doc: Document) {
        drop(doc);
    }
}

/// Copies pages of one source into one target
///
/// The id map lives as long as the copier, so an object shared by several
/// pages (fonts, resource dictionaries, images) is cloned only once.
struct PageCopier<'a> {
    source: &'a Document,
    all_page_ids: &'a HashSet<ObjectId>,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document, all_page_ids: &'a HashSet<ObjectId>) -> Self {
        Self {
            source,
            all_page_ids,
            id_map: HashMap::new(),
        }
    }

    /// Clone one page and everything it references that is not in `target`
    /// yet. Returns the id of the new page object, parented to `pages_id`.
    fn copy_page(&mut self, target: &mut Document, page_id: ObjectId, pages_id: ObjectId) -> Result<ObjectId> {
        let mut page = Object::Dictionary(flatten_page(self.source, page_id)?);

        // Other pages are never followed; links to them end up as null
        let mut referenced = BTreeSet::new();
        collect_references(self.source, &page, self.all_page_ids, &mut referenced);
        referenced.retain(|id| !self.id_map.contains_key(id));

        let new_page_id = target.new_object_id();
        self.id_map.insert(page_id, new_page_id);
        for &old_id in &referenced {
            self.id_map.insert(old_id, target.new_object_id());
        }

        for &old_id in &referenced {
            let mut object = self
                .source
                .get_object(old_id)
                .map_err(|e| PdfSplitError::EngineError(format!("Missing object {:?}: {}", old_id, e)))?
                .clone();
            remap_references(&mut object, &self.id_map);
            target.objects.insert(self.id_map[&old_id], object);
        }

        remap_references(&mut page, &self.id_map);
        if let Object::Dictionary(ref mut dict) = page {
            dict.set("Parent", Object::Reference(pages_id));
        }
        target.objects.insert(new_page_id, page);

        Ok(new_page_id)
    }
}

/// The page dictionary with inherited attributes copied in and `/Parent`
/// removed
fn flatten_page(source: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = source
        .get_dictionary(page_id)
        .map_err(|e| PdfSplitError::EngineError(format!("Invalid page object {:?}: {}", page_id, e)))?
        .clone();

    let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = source.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Collect ids of every object reachable from `object`, skipping `/Parent`
/// links and page objects
fn collect_references(
    source: &Document,
    object: &Object,
    skip: &HashSet<ObjectId>,
    seen: &mut BTreeSet<ObjectId>,
) {
    match object {
        Object::Reference(id) => {
            if skip.contains(id) || !seen.insert(*id) {
                return;
            }
            if let Ok(target) = source.get_object(*id) {
                collect_references(source, target, skip, seen);
            }
        }
        Object::Array(items) => {
            for item in items {
                collect_references(source, item, skip, seen);
            }
        }
        Object::Dictionary(dict) => {
            for (key, value) in dict.iter() {
                if key.as_slice() != b"Parent" {
                    collect_references(source, value, skip, seen);
                }
            }
        }
        Object::Stream(stream) => {
            for (key, value) in stream.dict.iter() {
                if key.as_slice() != b"Parent" {
                    collect_references(source, value, skip, seen);
                }
            }
        }
        _ => {}
    }
}

/// Rewrite references through `id_map`; anything not copied becomes null
fn remap_references(object: &mut Object, id_map: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            *object = match id_map.get(id) {
                Some(&new_id) => Object::Reference(new_id),
                None => Object::Null,
            };
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                remap_references(item, id_map);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap_references(value, id_map);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap_references(value, id_map);
            }
        }
        _ => {}
    }
}

/// Id of the catalog dictionary
pub(super) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .map_err(|_| PdfSplitError::EngineError("No Root in trailer".into()))?
        .as_reference()
        .map_err(|_| PdfSplitError::EngineError("Root is not a reference".into()))
}

/// Id of the root of the page tree
fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    let catalog = doc
        .get_dictionary(catalog_id(doc)?)
        .map_err(|_| PdfSplitError::EngineError("Invalid catalog".into()))?;

    catalog
        .get(b"Pages")
        .map_err(|_| PdfSplitError::EngineError("No Pages in catalog".into()))?
        .as_reference()
        .map_err(|_| PdfSplitError::EngineError("Pages is not a reference".into()))
}

fn append_kids(doc: &mut Document, pages_id: ObjectId, new_kids: Vec<Object>) -> Result<()> {
    let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) else {
        return Err(PdfSplitError::EngineError(
            "Invalid pages dictionary".into(),
        ));
    };

    let mut kids = match pages_dict.get(b"Kids") {
        Ok(Object::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    kids.extend(new_kids);

    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{content::Content, content::Operation, Stream};
    use pretty_assertions::assert_eq;

    /// Build a PDF with one page per entry of `texts`
    ///
    /// Resources and MediaBox live on the page tree root so copying has to
    /// resolve inherited attributes.
    pub(crate) fn create_test_pdf(texts: &[&str]) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]));

        let mut page_ids = Vec::new();
        for text in texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                    ),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            text.as_bytes().to_vec(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(texts.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc
    }

    fn reload(doc: &mut Document) -> Document {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        Document::load_mem(&buffer).unwrap()
    }

    #[test]
    fn test_page_count_and_text() {
        let engine = LopdfEngine::new();
        let doc = create_test_pdf(&["Alpha", "Beta", "Gamma"]);
        assert_eq!(engine.page_count(&doc), 3);
        assert!(engine.page_text(&doc, 1).unwrap().contains("Beta"));
    }

    #[test]
    fn test_new_document_is_empty() {
        let engine = LopdfEngine::new();
        let mut doc = engine.new_document().unwrap();
        let reloaded = reload(&mut doc);
        assert_eq!(reloaded.get_pages().len(), 0);
    }

    #[test]
    fn test_copy_pages_preserves_order() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["One", "Two", "Three", "Four", "Five"]);
        let mut target = engine.new_document().unwrap();

        engine.copy_pages(&mut target, &source, 1..4).unwrap();
        let reloaded = reload(&mut target);

        assert_eq!(engine.page_count(&reloaded), 3);
        let texts: Vec<String> = (0..3).map(|i| engine.page_text(&reloaded, i).unwrap()).collect();
        assert!(texts[0].contains("Two"));
        assert!(texts[1].contains("Three"));
        assert!(texts[2].contains("Four"));
    }

    #[test]
    fn test_copy_pages_flattens_inherited_attributes() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["Only"]);
        let mut target = engine.new_document().unwrap();

        engine.copy_pages(&mut target, &source, 0..1).unwrap();

        let page_id = *target.get_pages().get(&1).unwrap();
        let page = target.get_dictionary(page_id).unwrap();
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn test_copy_pages_does_not_pull_other_pages() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["A", "B", "C", "D"]);
        let mut target = engine.new_document().unwrap();

        engine.copy_pages(&mut target, &source, 2..3).unwrap();

        assert_eq!(count_type(&target, b"Page"), 1);
    }

    fn count_type(doc: &Document, type_name: &[u8]) -> usize {
        doc.objects
            .values()
            .filter(|o| {
                o.as_dict()
                    .ok()
                    .and_then(|d| d.get(b"Type").ok())
                    .and_then(|t| t.as_name().ok())
                    == Some(type_name)
            })
            .count()
    }

    #[test]
    fn test_copy_pages_shares_common_resources() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["One", "Two", "Three", "Four", "Five"]);
        assert_eq!(count_type(&source, b"Font"), 1);

        let mut target = engine.new_document().unwrap();
        engine.copy_pages(&mut target, &source, 0..5).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        engine.save(&mut target, &path, SaveOptions::optimized()).unwrap();
        let reopened = engine.open(&path).unwrap();

        assert_eq!(engine.page_count(&reopened), 5);
        assert_eq!(count_type(&reopened, b"Font"), 1);

        let resources: HashSet<ObjectId> = reopened
            .get_pages()
            .values()
            .map(|id| {
                reopened
                    .get_dictionary(*id)
                    .unwrap()
                    .get(b"Resources")
                    .unwrap()
                    .as_reference()
                    .unwrap()
            })
            .collect();
        assert_eq!(resources.len(), 1);
        assert!(engine.page_text(&reopened, 4).unwrap().contains("Five"));
    }

    #[test]
    fn test_copy_pages_out_of_bounds_fails() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["A", "B"]);
        let mut target = engine.new_document().unwrap();
        assert!(engine.copy_pages(&mut target, &source, 1..3).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let engine = LopdfEngine::new();
        let result = engine.open(Path::new("/definitely/not/here.pdf"));
        assert!(matches!(result, Err(PdfSplitError::InputNotFound(_))));
    }

    #[test]
    fn test_open_garbage_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = LopdfEngine::new().open(&path);
        assert!(matches!(result, Err(PdfSplitError::LoadError(_))));
    }

    #[test]
    fn test_save_with_optimized_options() {
        let engine = LopdfEngine::new();
        let source = create_test_pdf(&["A", "B", "C"]);
        let mut target = engine.new_document().unwrap();
        engine.copy_pages(&mut target, &source, 0..2).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        engine.save(&mut target, &path, SaveOptions::optimized()).unwrap();

        let reopened = engine.open(&path).unwrap();
        assert_eq!(engine.page_count(&reopened), 2);
        assert!(engine.page_text(&reopened, 1).unwrap().contains('B'));
    }
}

//! Document outline (bookmarks) on top of lopdf
//!
//! Reading walks the `/Outlines` tree through `/First` and `/Next` links and
//! flattens it into [`TocEntry`]s. Writing builds a fresh tree from a flat
//! level sequence.

use super::lopdf_backend::catalog_id;
use crate::error::{PdfSplitError, Result};
use crate::toc::TocEntry;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Guards against circular outline links
const MAX_DEPTH: u32 = 64;
const MAX_SIBLINGS: usize = 10_000;

/// Flattened outline in document order
///
/// Entries whose destination can't be resolved to a page are left out; their
/// children are still visited.
pub fn read_outline(doc: &Document) -> Vec<TocEntry> {
    let Some(first) = outline_root(doc).and_then(|root| root.get(b"First").ok()?.as_reference().ok())
    else {
        return Vec::new();
    };

    let page_numbers: HashMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    walk(doc, first, 1, &page_numbers, &mut visited, &mut entries);
    entries
}

fn outline_root(doc: &Document) -> Option<&Dictionary> {
    let catalog = doc.get_dictionary(catalog_id(doc).ok()?).ok()?;
    resolve(doc, catalog.get(b"Outlines").ok()?).as_dict().ok()
}

fn walk(
    doc: &Document,
    first: ObjectId,
    level: u32,
    page_numbers: &HashMap<ObjectId, u32>,
    visited: &mut HashSet<ObjectId>,
    entries: &mut Vec<TocEntry>,
) {
    if level > MAX_DEPTH {
        return;
    }

    let mut current = Some(first);
    let mut siblings = 0;
    while let Some(node_id) = current {
        if !visited.insert(node_id) || siblings >= MAX_SIBLINGS {
            break;
        }
        siblings += 1;

        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        let title = node
            .get(b"Title")
            .map(|t| decode_text(resolve(doc, t)))
            .unwrap_or_default();

        match destination_page(doc, node, page_numbers) {
            Some(page) => entries.push(TocEntry::new(level, title, page)),
            None if level == 1 => warn!(
                title = %title,
                "Top-level outline entry has no page destination, its nested entries fall into the previous section"
            ),
            None => debug!(title = %title, "Skipping outline entry without a page destination"),
        }

        if let Ok(Object::Reference(child)) = node.get(b"First") {
            walk(doc, *child, level + 1, page_numbers, visited, entries);
        }

        current = match node.get(b"Next") {
            Ok(Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }
}

/// 1-indexed page an outline item points at, via `/Dest` or a GoTo `/A`
fn destination_page(
    doc: &Document,
    node: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    if let Ok(dest) = node.get(b"Dest") {
        if let Some(page) = resolve_destination(doc, dest, page_numbers, 0) {
            return Some(page);
        }
    }

    let action = resolve(doc, node.get(b"A").ok()?).as_dict().ok()?;
    if action.get(b"S").ok()?.as_name().ok()? != b"GoTo" {
        return None;
    }
    resolve_destination(doc, action.get(b"D").ok()?, page_numbers, 0)
}

fn resolve_destination(
    doc: &Document,
    dest: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
    depth: u32,
) -> Option<u32> {
    if depth > 4 {
        return None;
    }

    match resolve(doc, dest) {
        // Explicit destination: [page_ref /Fit ...]
        Object::Array(items) => match items.first()? {
            Object::Reference(page_id) => page_numbers.get(page_id).copied(),
            // Remote-style integer page index, 0-based
            Object::Integer(index) => u32::try_from(*index).ok().map(|i| i + 1),
            _ => None,
        },
        // Named destination dictionary: << /D [...] >>
        Object::Dictionary(dict) => {
            resolve_destination(doc, dict.get(b"D").ok()?, page_numbers, depth + 1)
        }
        Object::Name(name) | Object::String(name, _) => {
            let target = named_destination(doc, name)?;
            resolve_destination(doc, target, page_numbers, depth + 1)
        }
        _ => None,
    }
}

/// Look a name up in the catalog `/Dests` dictionary, then the `/Names`
/// `/Dests` name tree
fn named_destination<'a>(doc: &'a Document, name: &[u8]) -> Option<&'a Object> {
    let catalog = doc.get_dictionary(catalog_id(doc).ok()?).ok()?;

    if let Ok(dests) = catalog.get(b"Dests") {
        if let Ok(found) = resolve(doc, dests).as_dict().and_then(|d| d.get(name)) {
            return Some(found);
        }
    }

    let names = resolve(doc, catalog.get(b"Names").ok()?).as_dict().ok()?;
    let tree = resolve(doc, names.get(b"Dests").ok()?).as_dict().ok()?;
    search_name_tree(doc, tree, name, 0)
}

fn search_name_tree<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    name: &[u8],
    depth: u32,
) -> Option<&'a Object> {
    if depth > MAX_DEPTH {
        return None;
    }

    if let Ok(Object::Array(pairs)) = node.get(b"Names").map(|n| resolve(doc, n)) {
        for pair in pairs.chunks(2) {
            if let [Object::String(key, _), value] = pair {
                if key.as_slice() == name {
                    return Some(value);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = node.get(b"Kids").map(|k| resolve(doc, k)) {
        for kid in kids {
            if let Ok(kid) = resolve(doc, kid).as_dict() {
                if let Some(found) = search_name_tree(doc, kid, name, depth + 1) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Follow a reference, or hand back the object itself
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// PDF text string: UTF-16BE with a byte order mark, otherwise single-byte
fn decode_text(object: &Object) -> String {
    let Object::String(bytes, _) = object else {
        return String::new();
    };

    if let Some(utf16) = bytes.strip_prefix(&[0xFE_u8, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Ok(text) = std::str::from_utf8(bytes) {
        text.to_string()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn encode_text(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Replace the document outline with `toc`
///
/// Levels need not be contiguous: an entry hangs under the closest preceding
/// entry with a smaller level. Entries pointing at missing pages keep their
/// title but get no destination.
pub fn write_outline(doc: &mut Document, toc: &[TocEntry]) -> Result<()> {
    let catalog_ref = catalog_id(doc)?;

    if toc.is_empty() {
        if let Ok(catalog) = doc.get_object_mut(catalog_ref).and_then(Object::as_dict_mut) {
            catalog.remove(b"Outlines");
        }
        return Ok(());
    }

    let page_ids = doc.get_pages();
    let root_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = toc.iter().map(|_| doc.new_object_id()).collect();

    // Parent index for every entry, None = outline root
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(toc.len());
    let mut stack: Vec<usize> = Vec::new();
    for (i, entry) in toc.iter().enumerate() {
        while stack.last().is_some_and(|&top| toc[top].level >= entry.level) {
            stack.pop();
        }
        parents.push(stack.last().copied());
        stack.push(i);
    }

    let mut children: BTreeMap<Option<usize>, Vec<usize>> = BTreeMap::new();
    for (i, parent) in parents.iter().enumerate() {
        children.entry(*parent).or_default().push(i);
    }

    let descendants = |index: Option<usize>| -> i64 {
        let mut count = 0;
        let mut pending: Vec<usize> = children.get(&index).cloned().unwrap_or_default();
        while let Some(next) = pending.pop() {
            count += 1;
            pending.extend(children.get(&Some(next)).into_iter().flatten());
        }
        count
    };

    for (i, entry) in toc.iter().enumerate() {
        let parent_ref = parents[i].map_or(root_id, |p| item_ids[p]);
        let mut item = Dictionary::from_iter(vec![
            ("Title", encode_text(&entry.title)),
            ("Parent", Object::Reference(parent_ref)),
        ]);

        match page_ids.get(&entry.page) {
            Some(&page_id) => {
                item.set(
                    "Dest",
                    Object::Array(vec![Object::Reference(page_id), Object::Name(b"Fit".to_vec())]),
                );
            }
            None => debug!(title = %entry.title, page = entry.page, "Outline entry points past the last page"),
        }

        let siblings = &children[&parents[i]];
        let position = siblings.iter().position(|&s| s == i).unwrap_or(0);
        if position > 0 {
            item.set("Prev", Object::Reference(item_ids[siblings[position - 1]]));
        }
        if let Some(&next) = siblings.get(position + 1) {
            item.set("Next", Object::Reference(item_ids[next]));
        }

        if let Some(kids) = children.get(&Some(i)) {
            item.set("First", Object::Reference(item_ids[kids[0]]));
            item.set("Last", Object::Reference(item_ids[kids[kids.len() - 1]]));
            item.set("Count", Object::Integer(descendants(Some(i))));
        }

        doc.objects.insert(item_ids[i], Object::Dictionary(item));
    }

    let top = &children[&None];
    let root = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Outlines".to_vec())),
        ("First", Object::Reference(item_ids[top[0]])),
        ("Last", Object::Reference(item_ids[top[top.len() - 1]])),
        ("Count", Object::Integer(descendants(None))),
    ]);
    doc.objects.insert(root_id, Object::Dictionary(root));

    let catalog = doc
        .get_object_mut(catalog_ref)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfSplitError::EngineError("Invalid catalog".into()))?;
    catalog.set("Outlines", Object::Reference(root_id));
    Ok(())
}

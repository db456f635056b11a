use crate::pdf_utils;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Where a discovered file specification lives.
#[derive(Debug, Clone)]
pub enum FileSpecLocation {
    /// An indirect file specification object.
    Reference(ObjectId),
    /// A file specification written inline in its parent.
    Inline(Dictionary),
    /// The entry points at something that is not a file specification.
    Invalid(&'static str),
}

/// One entry of the document's attachment collection, not yet resolved.
#[derive(Debug, Clone)]
pub struct FileSpecEntry {
    /// Name-tree key or annotation label, used when the specification
    /// carries no filename of its own.
    pub name: String,
    pub location: FileSpecLocation,
}

/// Finds embedded file specifications in a PDF document.
///
/// Two sources are searched:
/// 1. The /Names/EmbeddedFiles name tree in the document catalog
/// 2. /FileAttachment annotations on pages
pub struct FileSpecDiscovery<'a> {
    document: &'a Document,
}

impl<'a> FileSpecDiscovery<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    fn resolve_dict(&self, value: &'a Object) -> Option<&'a Dictionary> {
        pdf_utils::resolve(self.document, value).and_then(|o| o.as_dict().ok())
    }

    fn resolve_array(&self, value: &'a Object) -> Option<&'a Vec<Object>> {
        pdf_utils::resolve(self.document, value).and_then(|o| o.as_array().ok())
    }

    fn locate(value: &Object) -> FileSpecLocation {
        match value {
            Object::Reference(id) => FileSpecLocation::Reference(*id),
            Object::Dictionary(dict) => FileSpecLocation::Inline(dict.clone()),
            _ => FileSpecLocation::Invalid("name tree value is not a file specification"),
        }
    }

    /// Process a names array of `[key value key value …]` pairs.
    fn process_names_array(&self, names_array: &[Object]) -> Vec<FileSpecEntry> {
        names_array
            .chunks_exact(2)
            .map(|pair| {
                let name = pair[0]
                    .as_str()
                    .map(pdf_utils::decode_text_string)
                    .unwrap_or_default();
                FileSpecEntry {
                    name,
                    location: Self::locate(&pair[1]),
                }
            })
            .collect()
    }

    /// Collect every embedded-file specification in the document.
    ///
    /// A specification reachable from both the name tree and an annotation
    /// is reported once.
    pub fn collect_file_specs(&self) -> Vec<FileSpecEntry> {
        let mut seen = HashSet::new();

        self.collect_from_names_tree()
            .into_iter()
            .chain(self.collect_from_annotations())
            .filter(|entry| match entry.location {
                FileSpecLocation::Reference(id) => seen.insert(id),
                _ => true,
            })
            .collect()
    }

    /// Collect file specifications from the document's names tree.
    fn collect_from_names_tree(&self) -> Vec<FileSpecEntry> {
        let Ok(catalog) = self.document.catalog() else {
            return Vec::new();
        };

        let Some(names_dict) = catalog.get(b"Names").ok().and_then(|v| self.resolve_dict(v)) else {
            return Vec::new();
        };

        match names_dict
            .get(b"EmbeddedFiles")
            .ok()
            .and_then(|v| self.resolve_dict(v))
        {
            Some(root) => self.walk_name_tree(root, &mut HashSet::new()),
            None => Vec::new(),
        }
    }

    /// Collect file specifications from page FileAttachment annotations.
    fn collect_from_annotations(&self) -> Vec<FileSpecEntry> {
        self.document
            .get_pages()
            .values()
            .flat_map(|page_id| self.process_page_annotations(*page_id))
            .collect()
    }

    fn process_page_annotations(&self, page_id: ObjectId) -> Vec<FileSpecEntry> {
        let Ok(page_dict) = self.document.get_dictionary(page_id) else {
            return Vec::new();
        };

        let Some(annots) = page_dict.get(b"Annots").ok().and_then(|v| self.resolve_array(v)) else {
            return Vec::new();
        };

        annots
            .iter()
            .filter_map(|item| self.resolve_dict(item))
            .filter_map(Self::process_file_attachment_annotation)
            .collect()
    }

    fn process_file_attachment_annotation(dict: &Dictionary) -> Option<FileSpecEntry> {
        let subtype = dict.get(b"Subtype").ok()?.as_name().ok()?;
        if subtype != b"FileAttachment" {
            return None;
        }

        let fs_val = dict.get(b"FS").ok()?;
        Some(FileSpecEntry {
            name: Self::annotation_name(dict),
            location: Self::locate(fs_val),
        })
    }

    /// Recursively walk a PDF name tree, collecting entries from leaf nodes.
    /// `visited` guards against cyclic /Kids.
    fn walk_name_tree(&self, node: &'a Dictionary, visited: &mut HashSet<ObjectId>) -> Vec<FileSpecEntry> {
        let mut out = Vec::new();

        // Leaf node: has a /Names array of [key, value, key, value, …]
        if let Some(arr) = node.get(b"Names").ok().and_then(|v| self.resolve_array(v)) {
            out.extend(self.process_names_array(arr));
        }

        // Intermediate node: has a /Kids array of references
        if let Some(kids) = node.get(b"Kids").ok().and_then(|v| self.resolve_array(v)) {
            for kid in kids {
                if let Ok(kid_id) = kid.as_reference() {
                    if !visited.insert(kid_id) {
                        continue;
                    }
                }
                if let Some(kid_dict) = self.resolve_dict(kid) {
                    out.extend(self.walk_name_tree(kid_dict, visited));
                }
            }
        }

        out
    }

    /// Falls back to `"attachment"` if neither `/Contents` nor `/T` is set.
    fn annotation_name(dict: &Dictionary) -> String {
        for key in [b"Contents" as &[u8], b"T"] {
            if let Some(name) = pdf_utils::extract_string_from_dict(dict, key) {
                return name;
            }
        }
        "attachment".into()
    }
}

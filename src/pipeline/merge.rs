//! Merging sorted payslips into one output document.
//!
//! Uses lopdf object renumbering to concatenate the full page content of
//! every input, in order, under a single catalog. Input object ids are
//! renumbered monotonically per document, so iterating the collected pages
//! by id preserves input order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

/// Errors from the merge step. All of these are fatal to the run.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An input document failed to load.
    #[error("Failed to load {path}: {source}")]
    Load {
        /// Path to the input PDF
        path: PathBuf,
        /// The underlying PDF error
        #[source]
        source: lopdf::Error,
    },

    /// No page objects were found across the inputs.
    #[error("No pages found in input documents")]
    NoPages,

    /// No catalog object was found across the inputs.
    #[error("No catalog found in input documents")]
    NoCatalog,

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The merged document could not be written.
    #[error("Failed to save merged output {path}: {source}")]
    Save {
        /// Path to the output PDF
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Merge the given PDFs, in order, into one document at `output_path`.
///
/// Parent directories are created as needed. Returns the number of pages
/// in the merged output.
pub fn merge_documents(inputs: &[PathBuf], output_path: &Path) -> Result<usize, MergeError> {
    let mut max_id = 1;
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for path in inputs {
        let mut doc = Document::load(path).map_err(|source| MergeError::Load {
            path: path.clone(),
            source,
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            if let Some(dictionary) = flattened_page(&doc, object_id) {
                pages.insert(object_id, Object::Dictionary(dictionary));
            }
        }
        objects.extend(doc.objects);
    }

    // Rebuild a single Pages tree and Catalog from the collected objects
    let mut pages_object: Option<(ObjectId, Object)> = None;
    let mut catalog_object: Option<(ObjectId, Object)> = None;

    let mut merged = Document::with_version("1.5");

    for (object_id, object) in objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                if catalog_object.is_none() {
                    catalog_object = Some((object_id, object));
                }
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(old_dictionary) = existing.as_dict() {
                            dictionary.extend(old_dictionary);
                        }
                    }
                    pages_object = Some((object_id, Object::Dictionary(dictionary)));
                }
            }
            // Page objects are re-parented below; outlines are dropped
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, pages_root) = pages_object.ok_or(MergeError::NoPages)?;
    if pages.is_empty() {
        return Err(MergeError::NoPages);
    }

    for (object_id, object) in &pages {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            merged
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_root.as_dict() {
        let mut dictionary = dictionary.clone();
        // Pages carry their own flattened Resources; a leftover root
        // entry would wrongly apply one source's fonts to all of them
        dictionary.remove(b"Resources");
        dictionary.set("Count", pages.len() as u32);
        dictionary.set(
            "Kids",
            pages
                .keys()
                .map(|object_id| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_id, Object::Dictionary(dictionary));
    }

    let (catalog_id, catalog_root) = catalog_object.ok_or(MergeError::NoCatalog)?;
    if let Ok(dictionary) = catalog_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| MergeError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    merged.save(output_path).map_err(|source| MergeError::Save {
        path: output_path.to_path_buf(),
        source,
    })?;

    Ok(pages.len())
}

/// Clone a page dictionary with its inheritable attributes resolved.
///
/// A page may inherit Resources or MediaBox from its Pages ancestors.
/// The merge discards every source Pages node, so inherited values must
/// be copied down onto the page itself or its fonts become unreachable.
fn flattened_page(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut dictionary = doc.get_object(page_id).ok()?.as_dict().ok()?.clone();
    for key in [b"Resources".as_slice(), b"MediaBox".as_slice()] {
        if !dictionary.has(key) {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                dictionary.set(key, value);
            }
        }
    }
    Some(dictionary)
}

/// Look up an inheritable page attribute, walking the Parent chain.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    loop {
        let dictionary = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dictionary.get(key) {
            return Some(value.clone());
        }
        current = dictionary.get(b"Parent").ok()?.as_reference().ok()?;
    }
}

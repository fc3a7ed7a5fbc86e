//! Core layer: pure extraction and decoding over fetched bodies.

use scraper::Html;
use scraper::node::Node;

use crate::data::{ArchiveEntry, MAX_ARCHIVE_ENTRIES};
use crate::error::CatalogError;

/// Custom element the program page exposes the archive id on.
pub const ARCHIVE_ELEMENT: &str = "wmse-archive";

/// Attribute of [`ARCHIVE_ELEMENT`] carrying the id.
pub const ARCHIVE_ID_ATTR: &str = "show-id";

/// Nesting bound for the document walk; deeper input is not traversed.
const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Walk the parsed document depth-first in document order and return the
/// id attribute of the first archive element that carries one.
///
/// The walk uses an explicit stack, so adversarially nested input cannot
/// overflow the call stack; nodes below [`MAX_TRAVERSAL_DEPTH`] are skipped.
pub fn extract_archive_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let mut stack = vec![(document.tree.root(), 0usize)];

    while let Some((node, depth)) = stack.pop() {
        if let Node::Element(element) = node.value() {
            if element.name() == ARCHIVE_ELEMENT {
                if let Some(id) = element.attr(ARCHIVE_ID_ATTR) {
                    return Some(id.to_string());
                }
            }
        }
        if depth < MAX_TRAVERSAL_DEPTH {
            // Children pushed in reverse so the stack pops in document order.
            for child in node.children().collect::<Vec<_>>().into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    None
}

/// Decode a catalog body, enforcing the entry-count ceiling.
pub fn decode_archives(body: &[u8]) -> Result<Vec<ArchiveEntry>, CatalogError> {
    let entries: Vec<ArchiveEntry> = serde_json::from_slice(body)?;
    if entries.len() > MAX_ARCHIVE_ENTRIES {
        return Err(CatalogError::TooManyEntries {
            count: entries.len(),
            limit: MAX_ARCHIVE_ENTRIES,
        });
    }
    Ok(entries)
}

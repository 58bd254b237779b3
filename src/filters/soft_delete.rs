//! Manifest-based removal of line items
//!
//! Removed lines stay in storage; a document lists them in `removed_items`
//! and every reader drops them from the active item list.

use std::collections::HashSet;

use crate::types::*;

/// A line item matched against removal manifests by identifier
pub trait Identified {
    fn item_uuid(&self) -> Option<&str>;
}

/// A document carrying a removed-items manifest next to its items
pub trait HasRemovedItems {
    type Item: Identified;

    fn removed_items(&self) -> &[RemovedItem];

    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
}

impl Identified for OrderLineItem {
    fn item_uuid(&self) -> Option<&str> {
        self.item_uuid.as_deref()
    }
}

impl Identified for ReceiptNoteItem {
    fn item_uuid(&self) -> Option<&str> {
        self.item_uuid.as_deref()
    }
}

impl Identified for InvoiceLineItem {
    fn item_uuid(&self) -> Option<&str> {
        self.item_uuid.as_deref()
    }
}

impl HasRemovedItems for Order {
    type Item = OrderLineItem;

    fn removed_items(&self) -> &[RemovedItem] {
        &self.removed_items
    }

    fn items_mut(&mut self) -> &mut Vec<OrderLineItem> {
        &mut self.items
    }
}

impl HasRemovedItems for ReceiptNote {
    type Item = ReceiptNoteItem;

    fn removed_items(&self) -> &[RemovedItem] {
        &self.removed_items
    }

    fn items_mut(&mut self) -> &mut Vec<ReceiptNoteItem> {
        &mut self.items
    }
}

/// Key every identifier comparison in the crate goes through
///
/// Identifiers are UUID strings, so only ASCII letters are folded.
pub fn id_key(uuid: &str) -> String {
    uuid.to_ascii_lowercase()
}

/// Whether two identifiers name the same record
pub fn same_id(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right)
}

fn non_blank(uuid: Option<&str>) -> Option<&str> {
    uuid.filter(|uuid| !uuid.trim().is_empty())
}

/// Lowercased identifiers named by a manifest
fn removed_set(manifest: &[RemovedItem]) -> HashSet<String> {
    manifest
        .iter()
        .filter_map(|entry| non_blank(entry.item_uuid.as_deref()))
        .map(id_key)
        .collect()
}

/// Drop items whose identifier appears in the manifest, ignoring case
///
/// Items without an identifier are always kept.
pub fn filter_removed<T: Identified>(items: Vec<T>, manifest: &[RemovedItem]) -> Vec<T> {
    let removed = removed_set(manifest);
    if removed.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| match non_blank(item.item_uuid()) {
            Some(uuid) => !removed.contains(&id_key(uuid)),
            None => true,
        })
        .collect()
}

/// Filter a document's active items, leaving its manifest untouched
pub fn without_removed<D: HasRemovedItems>(mut document: D) -> D {
    let removed = removed_set(document.removed_items());
    if !removed.is_empty() {
        document.items_mut().retain(|item| match non_blank(item.item_uuid()) {
            Some(uuid) => !removed.contains(&id_key(uuid)),
            None => true,
        });
    }
    document
}

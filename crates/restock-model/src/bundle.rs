//! Item bundles
//!
//! A bundle is the unit a fulfillment option prices: one or more items with
//! quantities. Lines are kept sorted by item id and deduplicated so that two
//! bundles with the same content compare equal and hash identically. The
//! order idempotency key depends on this canonical form.

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};

/// A single line in an item bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl BundleLine {
    /// Create a new line
    #[inline]
    #[must_use]
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// A canonically ordered set of bundle lines
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemBundle {
    lines: Vec<BundleLine>,
}

impl ItemBundle {
    /// Build a bundle from lines, sorting and merging duplicates
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = BundleLine>) -> Self {
        let mut merged: Vec<BundleLine> = Vec::new();
        for line in lines {
            match merged.iter_mut().find(|l| l.item_id == line.item_id) {
                Some(existing) => existing.quantity += line.quantity,
                None => merged.push(line),
            }
        }
        merged.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Self { lines: merged }
    }

    /// Bundle with a single item
    #[inline]
    #[must_use]
    pub fn single(item_id: ItemId, quantity: u32) -> Self {
        Self::new([BundleLine::new(item_id, quantity)])
    }

    /// Lines in canonical (item id) order
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[BundleLine] {
        &self.lines
    }

    /// Number of distinct items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the bundle has no lines
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the bundle contains the given item
    #[inline]
    #[must_use]
    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.lines.iter().any(|l| &l.item_id == item_id)
    }

    /// Whether `other`'s items are a subset of this bundle's items
    #[must_use]
    pub fn covers(&self, other: &ItemBundle) -> bool {
        other.lines.iter().all(|l| self.contains(&l.item_id))
    }

    /// Item ids in canonical order
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.lines.iter().map(|l| &l.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(s: &str) -> ItemId {
        ItemId::from_str(s).unwrap()
    }

    #[test]
    fn bundle_is_canonical() {
        let a = ItemBundle::new([
            BundleLine::new(item("wipes"), 2),
            BundleLine::new(item("diapers-size4"), 1),
        ]);
        let b = ItemBundle::new([
            BundleLine::new(item("diapers-size4"), 1),
            BundleLine::new(item("wipes"), 2),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.lines()[0].item_id.as_str(), "diapers-size4");
    }

    #[test]
    fn duplicate_lines_merge() {
        let bundle = ItemBundle::new([
            BundleLine::new(item("wipes"), 2),
            BundleLine::new(item("wipes"), 3),
        ]);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.lines()[0].quantity, 5);
    }

    #[test]
    fn covers_subset() {
        let full = ItemBundle::new([
            BundleLine::new(item("wipes"), 1),
            BundleLine::new(item("diapers-size4"), 1),
        ]);
        let part = ItemBundle::single(item("wipes"), 1);
        assert!(full.covers(&part));
        assert!(!part.covers(&full));
    }
}

//! The cart model and its pure transitions.
//!
//! Every transition reports whether it changed the cart, so callers can skip
//! persisting and notifying on no-ops (e.g., incrementing an unknown id).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LineItem, NewLineItem, Price};

/// What `decrement` does to a line that is down to a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecrementPolicy {
    /// Drop the line from the cart.
    #[default]
    Remove,
    /// Keep the line at one unit.
    FloorAtOne,
}

/// Error parsing a [`DecrementPolicy`] from a string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown decrement policy '{0}' (expected 'remove' or 'floor')")]
pub struct DecrementPolicyError(String);

impl FromStr for DecrementPolicy {
    type Err = DecrementPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "floor" | "floor_at_one" => Ok(Self::FloorAtOne),
            other => Err(DecrementPolicyError(other.to_owned())),
        }
    }
}

impl fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => f.write_str("remove"),
            Self::FloorAtOne => f.write_str("floor"),
        }
    }
}

/// Ordered collection of line items, keyed by product id.
///
/// Serializes as a bare JSON array of [`LineItem`]s, which is the format of
/// the persisted cart slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over line items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of every line total, or `None` if any step overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.items.iter().try_fold(Price::ZERO, |total, item| {
            total.checked_add(item.line_total()?)
        })
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Add one unit of `candidate`.
    ///
    /// An existing line with the same id gets its quantity bumped; its other
    /// fields are left as they were. Otherwise the candidate is appended with
    /// a quantity of 1.
    pub fn add(&mut self, candidate: NewLineItem) -> bool {
        if let Some(existing) = self.get_mut(candidate.id.as_str()) {
            return bump(existing);
        }

        self.items.push(candidate.into_line_item());
        true
    }

    /// Add one unit to the line with `id`. Unknown ids are ignored.
    pub fn increment(&mut self, id: &str) -> bool {
        self.get_mut(id).is_some_and(bump)
    }

    /// Take one unit off the line with `id`. Unknown ids are ignored.
    ///
    /// A line never drops below one unit: at one, `policy` decides whether
    /// the line is removed or left alone. A line built with a zero quantity is
    /// treated as being at its last unit and is removed or raised to one.
    pub fn decrement(&mut self, id: &str, policy: DecrementPolicy) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };

        let Some(item) = self.items.get_mut(index) else {
            return false;
        };

        if item.quantity > 1 {
            item.quantity -= 1;
            return true;
        }

        match policy {
            DecrementPolicy::Remove => {
                self.items.remove(index);
                true
            }
            DecrementPolicy::FloorAtOne if item.quantity == 0 => {
                item.quantity = 1;
                true
            }
            DecrementPolicy::FloorAtOne => false,
        }
    }

    /// Drop the line with `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Drop every line.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }
}

fn bump(item: &mut LineItem) -> bool {
    match item.quantity.checked_add(1) {
        Some(next) => {
            item.quantity = next;
            true
        }
        None => false,
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

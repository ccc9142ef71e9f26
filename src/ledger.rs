//! Ordered line items of one transaction and the figures derived from them.
//!
//! Quantity and unit price are kept as the sanitized text the user typed;
//! `subtotal` and the ledger `total` are always recomputed from that text and
//! can not be written directly. Unparsable input counts as zero.
use crate::error::EngineError;
use std::collections::{BTreeMap, HashMap, HashSet};

/// The editable columns of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    ReferenceId,
    Quantity,
    UnitPrice,
}

/// List prices of the products a line item may reference.
pub trait PriceCatalog {
    fn unit_price(&self, reference_id: u64) -> Option<f64>;
}

impl PriceCatalog for HashMap<u64, f64> {
    fn unit_price(&self, reference_id: u64) -> Option<f64> {
        self.get(&reference_id).copied()
    }
}

impl PriceCatalog for BTreeMap<u64, f64> {
    fn unit_price(&self, reference_id: u64) -> Option<f64> {
        self.get(&reference_id).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    reference_id: String,
    quantity: String,
    unit_price: String,
    subtotal: f64,
}

impl LineItem {
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }
    pub fn quantity(&self) -> &str {
        &self.quantity
    }
    pub fn unit_price(&self) -> &str {
        &self.unit_price
    }
    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }
    pub fn value_of(&self, field: ItemField) -> &str {
        match field {
            ItemField::ReferenceId => &self.reference_id,
            ItemField::Quantity => &self.quantity,
            ItemField::UnitPrice => &self.unit_price,
        }
    }
    fn recompute(&mut self) {
        self.subtotal = parse_quantity(&self.quantity) as f64 * parse_price(&self.unit_price);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemLedger {
    items: Vec<LineItem>,
    total: f64,
}

impl LineItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a blank row and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.items.push(LineItem::default());
        self.recompute_total();
        self.items.len() - 1
    }

    /// Writes one column of row `index`.
    ///
    /// Quantity input keeps digits only, price input keeps digits and the
    /// first `.`. When a catalog is supplied, choosing a reference also
    /// fills the unit price with the catalog price, or clears it if the
    /// reference is unknown.
    pub fn update_item(
        &mut self,
        index: usize,
        field: ItemField,
        raw: &str,
        catalog: Option<&dyn PriceCatalog>,
    ) -> Result<(), EngineError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(EngineError::RowOutOfRange(index))?;

        match field {
            ItemField::Quantity => item.quantity = sanitize_quantity(raw),
            ItemField::UnitPrice => item.unit_price = sanitize_price(raw),
            ItemField::ReferenceId => {
                item.reference_id = raw.to_string();
                if let Some(catalog) = catalog {
                    item.unit_price = raw
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .and_then(|id| catalog.unit_price(id))
                        .map(|price| price.to_string())
                        .unwrap_or_default();
                }
            }
        }

        item.recompute();
        self.recompute_total();
        Ok(())
    }

    /// Removes row `index`; later rows move down by one.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, EngineError> {
        if index >= self.items.len() {
            return Err(EngineError::RowOutOfRange(index));
        }
        let removed = self.items.remove(index);
        self.recompute_total();
        Ok(removed)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }
    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.items.get(index)
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn total(&self) -> f64 {
        self.total
    }
    /// Equal to the total: no tax or discount is applied to line items.
    pub fn subtotal(&self) -> f64 {
        self.total
    }

    /// `false` when two rows point at the same reference.
    pub fn has_unique_references(&self) -> bool {
        let references: HashSet<&str> = self
            .items
            .iter()
            .map(|item| item.reference_id.as_str())
            .collect();
        references.len() == self.items.len()
    }

    fn recompute_total(&mut self) {
        self.total = self.items.iter().map(LineItem::subtotal).sum();
    }
}

pub fn sanitize_quantity(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn sanitize_price(raw: &str) -> String {
    let mut seen_dot = false;
    raw.chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect()
}

pub fn parse_quantity(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

pub fn parse_price(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => price,
        _ => 0.0,
    }
}

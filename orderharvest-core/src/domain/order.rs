//! Marketplace orders and their line items.

use super::item::Item;
use super::raw::{Fields, MappingError, RawRecord, PURCHASE_DATE_FORMAT};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw field holding the marketplace order identifier.
pub const ORDER_ID_FIELD: &str = "AmazonOrderId";

/// A single marketplace order.
///
/// `status` is kept as an opaque string: the marketplace adds new values
/// without notice. `items` keep the order in which the API returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: String,
    pub shipped_item_count: i64,
    pub unshipped_item_count: i64,
    /// Purchase timestamp, UTC.
    pub purchase_date: NaiveDateTime,
    /// Absent when the raw record had no `OrderTotal`; never defaulted to zero.
    pub total_amount: Option<Decimal>,
    pub items: Vec<Item>,
}

impl Order {
    /// Map a raw order record. Items are attached separately.
    ///
    /// A record without an identifier maps to an empty `id`.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, MappingError> {
        let fields = Fields::new("order", raw);

        let id = if fields.has(ORDER_ID_FIELD) {
            fields.string(ORDER_ID_FIELD)?
        } else {
            String::new()
        };

        let total_amount = if fields.has("OrderTotal") {
            Some(fields.decimal("OrderTotal.Amount")?)
        } else {
            None
        };

        Ok(Self {
            id,
            status: fields.string("OrderStatus")?,
            shipped_item_count: fields.integer("NumberOfItemsShipped")?,
            unshipped_item_count: fields.integer("NumberOfItemsUnshipped")?,
            purchase_date: fields.timestamp("PurchaseDate", PURCHASE_DATE_FORMAT)?,
            total_amount,
            items: Vec::new(),
        })
    }

    /// Whether the raw order record carries an identifier, so its items
    /// can be listed.
    pub fn carries_id(raw: &RawRecord) -> bool {
        Fields::new("order", raw).has(ORDER_ID_FIELD)
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Map a raw order-item record and append it.
    pub fn add_raw_item(&mut self, raw: &RawRecord) -> Result<(), MappingError> {
        self.items.push(Item::from_raw(raw)?);
        Ok(())
    }

    /// Sum of shipping prices over the items that carry one.
    pub fn shipping_amount(&self) -> Decimal {
        self.items.iter().filter_map(|i| i.shipping_price).sum()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = match self.total_amount {
            Some(total) => format!("{total:.2}"),
            None => "<NOAMOUNT>".to_string(),
        };
        write!(
            f,
            "<Order {} {} {} {} {} items, Shipping amt: {:.2}>",
            self.purchase_date.format("%Y-%m-%d"),
            self.id,
            self.status,
            amount,
            self.items.len(),
            self.shipping_amount()
        )
    }
}

//! Order line items.

use super::raw::{Fields, MappingError, RawRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line item of an order, normalized from a raw order-item record.
///
/// Price and item tax are only ever set together, as are shipping price and
/// shipping tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub unit_count: i64,
    pub quantity_shipped: i64,
    pub price: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub shipping_price: Option<Decimal>,
    pub shipping_tax: Option<Decimal>,
    pub asin: String,
    pub sku: String,
    pub title: String,
    pub order_item_id: String,
}

impl Item {
    /// Map a raw order-item record.
    ///
    /// The price pair is keyed on `ItemTax` and the shipping pair on
    /// `ShippingTax`: an `ItemPrice` without `ItemTax` leaves both absent.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, MappingError> {
        let fields = Fields::new("order item", raw);

        let (price, tax_amount) = if fields.has("ItemTax") {
            (
                Some(fields.decimal("ItemPrice.Amount")?),
                Some(fields.decimal("ItemTax.Amount")?),
            )
        } else {
            (None, None)
        };

        let (shipping_price, shipping_tax) = if fields.has("ShippingTax") {
            (
                Some(fields.decimal("ShippingPrice.Amount")?),
                Some(fields.decimal("ShippingTax.Amount")?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            unit_count: fields.integer("ProductInfo.NumberOfItems")?,
            quantity_shipped: fields.integer("QuantityShipped")?,
            price,
            tax_amount,
            shipping_price,
            shipping_tax,
            asin: fields.string("ASIN")?,
            sku: fields.string("SellerSKU")?,
            title: fields.string("Title")?,
            order_item_id: fields.string("OrderItemId")?,
        })
    }
}

fn amount_or_none(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "None".to_string(), |a| a.to_string())
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short_title: String = self.title.chars().take(15).collect();
        write!(
            f,
            "<Item {} {}... {} - {}>",
            self.asin,
            short_title,
            amount_or_none(self.price),
            amount_or_none(self.shipping_price)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn full_item() -> RawRecord {
        record(json!({
            "ProductInfo": {"NumberOfItems": "2"},
            "QuantityShipped": 1,
            "ItemPrice": {"CurrencyCode": "EUR", "Amount": "19.99"},
            "ItemTax": {"CurrencyCode": "EUR", "Amount": "3.47"},
            "ShippingPrice": {"CurrencyCode": "EUR", "Amount": "4.50"},
            "ShippingTax": {"CurrencyCode": "EUR", "Amount": "0.78"},
            "ASIN": "B00TEST123",
            "SellerSKU": "SKU-001",
            "Title": "Stainless steel water bottle 750ml",
            "OrderItemId": "12345678901234"
        }))
    }

    #[test]
    fn maps_all_fields() {
        let item = Item::from_raw(&full_item()).unwrap();
        assert_eq!(item.unit_count, 2);
        assert_eq!(item.quantity_shipped, 1);
        assert_eq!(item.price, Some(Decimal::new(1999, 2)));
        assert_eq!(item.tax_amount, Some(Decimal::new(347, 2)));
        assert_eq!(item.shipping_price, Some(Decimal::new(450, 2)));
        assert_eq!(item.shipping_tax, Some(Decimal::new(78, 2)));
        assert_eq!(item.asin, "B00TEST123");
        assert_eq!(item.sku, "SKU-001");
        assert_eq!(item.order_item_id, "12345678901234");
    }

    #[test]
    fn price_without_tax_is_dropped() {
        let mut raw = full_item();
        raw.remove("ItemTax");
        let item = Item::from_raw(&raw).unwrap();
        assert_eq!(item.price, None);
        assert_eq!(item.tax_amount, None);
        assert!(item.shipping_price.is_some());
    }

    #[test]
    fn shipping_pair_requires_shipping_tax() {
        let mut raw = full_item();
        raw.remove("ShippingTax");
        let item = Item::from_raw(&raw).unwrap();
        assert_eq!(item.shipping_price, None);
        assert_eq!(item.shipping_tax, None);
    }

    #[test]
    fn tax_without_price_is_a_mapping_error() {
        let mut raw = full_item();
        raw.remove("ItemPrice");
        let err = Item::from_raw(&raw).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { field, .. } if field == "ItemPrice.Amount"));
    }

    #[test]
    fn display_truncates_title() {
        let item = Item::from_raw(&full_item()).unwrap();
        assert_eq!(item.to_string(), "<Item B00TEST123 Stainless steel... 19.99 - 4.50>");
    }
}

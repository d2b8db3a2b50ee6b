//! Order model: raw marketplace records normalized into orders and items.

pub mod item;
pub mod order;
pub mod raw;

pub use item::Item;
pub use order::{Order, ORDER_ID_FIELD};
pub use raw::{MappingError, RawRecord, PURCHASE_DATE_FORMAT};

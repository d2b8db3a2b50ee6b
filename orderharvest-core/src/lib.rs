//! OrderHarvest Core: date ranges, call pacing, marketplace client, order model, run summary.
//!
//! One harvest run goes:
//! - [`range::resolve`] turns the date-selection inputs into an [`range::OrderFilter`]
//! - [`harvest::OrderHarvester`] pages through orders and fetches each order's
//!   items, consulting a [`throttle::Throttle`] before every call
//! - [`domain`] normalizes the raw records into [`domain::Order`] / [`domain::Item`]
//! - [`report::summarize`] sorts the result and computes the summary
//!
//! Everything is synchronous and single-threaded.

pub mod config;
pub mod domain;
pub mod harvest;
pub mod marketplace;
pub mod range;
pub mod report;
pub mod throttle;

pub use config::{ConfigError, HarvestConfig};
pub use domain::{Item, MappingError, Order, RawRecord};
pub use harvest::{HarvestError, HarvestProgress, HarvestRun, OrderHarvester, StdoutProgress};
pub use marketplace::{MarketplaceClient, OrdersPage, ServiceError, SpApiClient};
pub use range::{OrderFilter, RangeError, RangeRequest};
pub use report::{RunTiming, SummaryReport};
pub use throttle::{PacingSchedule, Throttle, ThrottleState};

//! Marketplace client trait and structured service errors.
//!
//! The harvester only needs two capabilities from the remote marketplace:
//! listing orders for a filter (one page per call) and listing the items of
//! one order. [`MarketplaceClient`] abstracts over them so the pipeline can
//! run against the Selling Partner API or an in-memory fake.

pub mod region;
pub mod sp_api;

pub use region::{lookup_marketplace, Marketplace, Region, MARKETPLACES};
pub use sp_api::{Credentials, SpApiClient};

use crate::domain::RawRecord;
use crate::range::OrderFilter;
use thiserror::Error;

/// Upper bound on continuation pages followed for a single listing.
pub const MAX_PAGES: usize = 1_000;

/// Remote call failures. None of these are retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request throttled by the marketplace{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("gave up after {pages} continuation pages")]
    PaginationLimit { pages: usize },

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(" (retry after {secs}s)"))
        .unwrap_or_default()
}

/// One page of raw order records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdersPage {
    pub orders: Vec<RawRecord>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Access to orders and order items for one configured marketplace.
///
/// Each method call is one outbound request as far as pacing is concerned.
pub trait MarketplaceClient {
    /// Fetch one page of orders. `next_token` is `None` for the first page.
    fn list_orders(
        &self,
        filter: &OrderFilter,
        next_token: Option<&str>,
    ) -> Result<OrdersPage, ServiceError>;

    /// Fetch all items of one order, in API order.
    fn list_order_items(&self, order_id: &str) -> Result<Vec<RawRecord>, ServiceError>;
}

impl<C: MarketplaceClient + ?Sized> MarketplaceClient for &C {
    fn list_orders(
        &self,
        filter: &OrderFilter,
        next_token: Option<&str>,
    ) -> Result<OrdersPage, ServiceError> {
        (**self).list_orders(filter, next_token)
    }

    fn list_order_items(&self, order_id: &str) -> Result<Vec<RawRecord>, ServiceError> {
        (**self).list_order_items(order_id)
    }
}

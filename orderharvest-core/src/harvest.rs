//! Harvest orchestrator: pages through orders, fetches each order's items,
//! and paces every outbound call.

use crate::domain::{MappingError, Order};
use crate::marketplace::{MarketplaceClient, ServiceError, MAX_PAGES};
use crate::range::OrderFilter;
use crate::throttle::{Sleeper, ThreadSleeper, Throttle, ThrottleState};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a harvest run stopped. Partial results are discarded.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Result of a completed harvest run.
#[derive(Debug, Clone)]
pub struct HarvestRun {
    /// Orders in the order the API returned them.
    pub orders: Vec<Order>,
    pub throttle: ThrottleState,
}

/// Progress callback for a harvest run.
pub trait HarvestProgress {
    /// Called before a pacing pause starts.
    fn on_pause(&self, wait: Duration, state: &ThrottleState);

    /// Called once an order and all its items are in.
    fn on_order(&self, order: &Order, index: usize);
}

/// Prints pacing notices and one line per order to stdout.
pub struct StdoutProgress;

impl HarvestProgress for StdoutProgress {
    fn on_pause(&self, wait: Duration, state: &ThrottleState) {
        println!(
            " ==== WAITING FOR: {} seconds. TOTAL: {} [QUERIES: {}] ====",
            wait.as_secs(),
            state.total_waited_secs(),
            state.query_count
        );
    }

    fn on_order(&self, order: &Order, _index: usize) {
        println!("{order}");
    }
}

/// Reports nothing.
pub struct SilentProgress;

impl HarvestProgress for SilentProgress {
    fn on_pause(&self, _wait: Duration, _state: &ThrottleState) {}

    fn on_order(&self, _order: &Order, _index: usize) {}
}

/// Drives one harvest run against a [`MarketplaceClient`].
///
/// Calls are strictly sequential: each page or item listing completes,
/// pause included, before the next is issued.
pub struct OrderHarvester<C, S: Sleeper = ThreadSleeper> {
    client: C,
    throttle: Throttle<S>,
}

impl<C: MarketplaceClient, S: Sleeper> OrderHarvester<C, S> {
    pub fn new(client: C, throttle: Throttle<S>) -> Self {
        Self { client, throttle }
    }

    /// Fetch every order matching `filter`, with items attached.
    ///
    /// Consumes the harvester; the pacing counters come back in the
    /// [`HarvestRun`].
    pub fn harvest(
        mut self,
        filter: &OrderFilter,
        progress: &dyn HarvestProgress,
    ) -> Result<HarvestRun, HarvestError> {
        let mut orders: Vec<Order> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0;

        loop {
            if pages >= MAX_PAGES {
                return Err(ServiceError::PaginationLimit { pages }.into());
            }

            self.pace(progress);
            let page = self.client.list_orders(filter, next_token.as_deref())?;
            pages += 1;
            debug!(page = pages, orders = page.orders.len(), "fetched orders page");

            for raw in &page.orders {
                let mut order = Order::from_raw(raw)?;

                if !Order::carries_id(raw) {
                    warn!(status = %order.status, "order without id, skipping items");
                } else {
                    self.pace(progress);
                    for raw_item in self.client.list_order_items(&order.id)? {
                        order.add_raw_item(&raw_item)?;
                    }
                }

                progress.on_order(&order, orders.len());
                orders.push(order);
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        let throttle = self.throttle.into_state();
        info!(
            orders = orders.len(),
            pages,
            queries = throttle.query_count,
            waited_secs = throttle.total_waited_secs(),
            "harvest complete"
        );

        Ok(HarvestRun { orders, throttle })
    }

    fn pace(&mut self, progress: &dyn HarvestProgress) {
        self.throttle
            .before_call_with(|wait, state| progress.on_pause(wait, state));
    }
}

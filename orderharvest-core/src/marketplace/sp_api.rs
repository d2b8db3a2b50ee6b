//! Selling Partner API client for the Orders v0 endpoints.
//!
//! Authenticates with a Login with Amazon refresh token, caches the access
//! token until shortly before it expires, and maps HTTP failures onto
//! [`ServiceError`]. Failed calls are not retried.

use super::region::Marketplace;
use super::{MarketplaceClient, OrdersPage, ServiceError, MAX_PAGES};
use crate::domain::{RawRecord, PURCHASE_DATE_FORMAT};
use crate::range::OrderFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Login with Amazon token endpoint.
pub const LWA_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Page size requested from `getOrders`; 100 is the API maximum.
const MAX_RESULTS_PER_PAGE: u32 = 100;

/// Access tokens are refreshed this long before they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Login with Amazon application credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("refresh_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

impl AccessToken {
    /// A token valid for `expires_in` seconds from `now`, due for refresh
    /// [`TOKEN_EXPIRY_MARGIN`] early.
    fn issued(value: String, expires_in: u64, now: Instant) -> Self {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            value,
            refresh_at: now + lifetime,
        }
    }
}

/// The cached token value, unless it is missing or due for refresh at `now`.
fn reusable_token(cached: Option<&AccessToken>, now: Instant) -> Option<String> {
    cached
        .filter(|token| now < token.refresh_at)
        .map(|token| token.value.clone())
}

/// `{"payload": ..., "errors": [...]}` envelope used by every Orders v0 response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    payload: Option<T>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OrdersPayload {
    #[serde(default)]
    orders: Vec<RawRecord>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OrderItemsPayload {
    #[serde(default)]
    order_items: Vec<RawRecord>,
    next_token: Option<String>,
}

/// Blocking client bound to one marketplace.
pub struct SpApiClient {
    http: reqwest::blocking::Client,
    credentials: Credentials,
    marketplace: &'static Marketplace,
    endpoint: String,
    token_url: String,
    token: Mutex<Option<AccessToken>>,
}

impl SpApiClient {
    /// Build a client for `marketplace`. `endpoint` overrides the regional
    /// endpoint (sandbox, proxies).
    pub fn new(
        credentials: Credentials,
        marketplace: &'static Marketplace,
        endpoint: Option<String>,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("orderharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::ClientSetup(e.to_string()))?;

        let endpoint = endpoint
            .unwrap_or_else(|| marketplace.region.endpoint().to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            credentials,
            marketplace,
            endpoint,
            token_url: LWA_TOKEN_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point token exchange somewhere other than Login with Amazon.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn marketplace(&self) -> &'static Marketplace {
        self.marketplace
    }

    /// Query parameters for one `getOrders` page.
    ///
    /// Continuation requests only carry the marketplace and the token; the
    /// API rejects filters combined with `NextToken`.
    fn orders_query(&self, filter: &OrderFilter, next_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![("MarketplaceIds", self.marketplace.id.to_string())];

        if let Some(token) = next_token {
            query.push(("NextToken", token.to_string()));
            return query;
        }

        query.push((
            "CreatedAfter",
            filter.created_after.format(PURCHASE_DATE_FORMAT).to_string(),
        ));
        if let Some(before) = filter.created_before {
            query.push(("CreatedBefore", before.format(PURCHASE_DATE_FORMAT).to_string()));
        }
        if !filter.statuses.is_empty() {
            query.push(("OrderStatuses", filter.statuses.join(",")));
        }
        query.push(("MaxResultsPerPage", MAX_RESULTS_PER_PAGE.to_string()));
        query
    }

    fn access_token(&self) -> Result<String, ServiceError> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = reusable_token(cached.as_ref(), Instant::now()) {
            return Ok(value);
        }

        debug!(url = %self.token_url, "exchanging refresh token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ServiceError::Authentication(format!(
                "token exchange returned HTTP {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .map_err(|e| ServiceError::ResponseFormat(format!("token response: {e}")))?;

        *cached = Some(AccessToken::issued(
            token.access_token.clone(),
            token.expires_in,
            Instant::now(),
        ));
        Ok(token.access_token)
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let token = self.access_token()?;
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, params = query.len(), "GET");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .header("x-amz-access-token", token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = resp.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), path, body, retry_after));
        }

        let envelope: Envelope<T> = resp
            .json()
            .map_err(|e| ServiceError::ResponseFormat(format!("{path}: {e}")))?;
        unwrap_payload(path, envelope)
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    ServiceError::NetworkUnreachable(err.to_string())
}

fn status_error(status: u16, endpoint: &str, body: String, retry_after: Option<u64>) -> ServiceError {
    match status {
        401 | 403 => ServiceError::Authentication(format!("HTTP {status} from {endpoint}: {body}")),
        429 => ServiceError::RateLimited {
            retry_after_secs: retry_after,
        },
        _ => ServiceError::Http {
            status,
            endpoint: endpoint.to_string(),
            body,
        },
    }
}

/// Follow continuation tokens until `fetch` returns a page without one.
///
/// `fetch` gets the token of the page to load (`None` for the first) and
/// returns that page's records and the next token. Fails after
/// [`MAX_PAGES`] pages.
fn collect_pages<T>(
    mut fetch: impl FnMut(Option<String>) -> Result<(Vec<T>, Option<String>), ServiceError>,
) -> Result<Vec<T>, ServiceError> {
    let mut records = Vec::new();
    let mut next_token = None;

    for _ in 0..MAX_PAGES {
        let (page, token) = fetch(next_token.take())?;
        records.extend(page);
        match token {
            Some(token) => next_token = Some(token),
            None => return Ok(records),
        }
    }

    Err(ServiceError::PaginationLimit { pages: MAX_PAGES })
}

fn unwrap_payload<T>(path: &str, envelope: Envelope<T>) -> Result<T, ServiceError> {
    match envelope.payload {
        Some(payload) => Ok(payload),
        None => {
            let detail = envelope
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            Err(ServiceError::ResponseFormat(if detail.is_empty() {
                format!("{path}: response has no payload")
            } else {
                format!("{path}: {detail}")
            }))
        }
    }
}

impl MarketplaceClient for SpApiClient {
    fn list_orders(
        &self,
        filter: &OrderFilter,
        next_token: Option<&str>,
    ) -> Result<OrdersPage, ServiceError> {
        let query = self.orders_query(filter, next_token);
        let payload: OrdersPayload = self.get("/orders/v0/orders", &query)?;
        debug!(
            orders = payload.orders.len(),
            more = payload.next_token.is_some(),
            "orders page"
        );
        Ok(OrdersPage {
            orders: payload.orders,
            next_token: payload.next_token,
        })
    }

    /// Item lists rarely span more than one page; continuation pages are
    /// followed here and count as a single call for pacing.
    fn list_order_items(&self, order_id: &str) -> Result<Vec<RawRecord>, ServiceError> {
        let path = format!("/orders/v0/orders/{order_id}/orderItems");
        collect_pages(|next_token| {
            let query: Vec<(&str, String)> = next_token
                .map(|token| vec![("NextToken", token)])
                .unwrap_or_default();
            let payload: OrderItemsPayload = self.get(&path, &query)?;
            Ok((payload.order_items, payload.next_token))
        })
    }
}

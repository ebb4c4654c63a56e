//! Ingestion client for the U.S. Treasury "Rates of Exchange" API.
//!
//! The remote resource is cursor-paginated: each page carries a `links.next`
//! fragment that, concatenated to the base URL, addresses the following
//! page. [`RatesClient`] walks the series sequentially until the server
//! reports no further page, a hard page cap trips, or a cyclic link is
//! detected, then returns the deduplicated aggregate.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::watch;

pub use error::RatesError;

mod error;
mod response;

use response::{RateRow, RatesPage};

/// Production base URL of the fiscal data service.
pub const DEFAULT_BASE_URL: &str = "https://api.fiscaldata.treasury.gov";

const RATES_OF_EXCHANGE_PATH: &str =
    "/services/api/fiscal_service/v1/accounting/od/rates_of_exchange";

/// Hard cap on pages fetched per call.
const MAX_PAGE_LOOPS: u32 = 100;

type ResultRates<T> = Result<T, RatesError>;

/// A published rate of exchange: units of foreign currency per one USD on a
/// given record date. Derived data, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExchangeRate {
    pub currency: String,
    pub exchange_rate: Decimal,
    pub record_date: NaiveDate,
}

/// Creates a cancellation pair for client operations.
///
/// Send `true` to abort an in-flight call at its next await point. Dropping
/// the sender without firing it leaves the operation uncancellable.
pub fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// HTTP client for the rates resource. Holds a reusable transport handle and
/// no other state across calls.
#[derive(Clone, Debug)]
pub struct RatesClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for RatesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RatesClient {
    /// Client against the production Treasury endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an alternative host (configuration, tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Retrieves the full list of published currency names.
    ///
    /// Names are deduplicated case-insensitively (first-seen casing wins)
    /// and returned sorted case-insensitively ascending. An exhausted series
    /// that produced no names fails with [`RatesError::NoData`] so callers
    /// can tell "nothing published" from an empty success.
    pub async fn get_currencies(
        &self,
        cancel: watch::Receiver<bool>,
    ) -> ResultRates<Vec<String>> {
        let base_url = format!(
            "{}{}?fields=country_currency_desc",
            self.base_url, RATES_OF_EXCHANGE_PATH
        );

        let mut currencies: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        self.walk_pages(&base_url, cancel, |row| {
            let Some(name) = row.currency.as_deref().map(str::trim) else {
                return;
            };
            if !name.is_empty() && seen.insert(name.to_lowercase()) {
                currencies.push(name.to_string());
            }
        })
        .await?;

        if currencies.is_empty() {
            return Err(RatesError::NoData);
        }
        currencies.sort_by_key(|name| name.to_lowercase());
        Ok(currencies)
    }

    /// Retrieves every exchange rate published within the inclusive date
    /// range, deduplicated by full value equality and sorted by currency
    /// name ascending.
    ///
    /// Fails with [`RatesError::InvalidRange`] before any network call when
    /// `min_date > max_date`.
    pub async fn get_exchange_rates(
        &self,
        min_date: NaiveDate,
        max_date: NaiveDate,
        cancel: watch::Receiver<bool>,
    ) -> ResultRates<Vec<ExchangeRate>> {
        if min_date > max_date {
            return Err(RatesError::InvalidRange);
        }

        let base_url = format!(
            "{}{}?filter=record_date:gte:{min_date},lte:{max_date}\
             &fields=country_currency_desc,record_date,exchange_rate",
            self.base_url, RATES_OF_EXCHANGE_PATH
        );

        let mut rates: Vec<ExchangeRate> = Vec::new();
        let mut seen: HashSet<ExchangeRate> = HashSet::new();
        self.walk_pages(&base_url, cancel, |row| {
            // Rows without a record date cannot form a rate record.
            let Some(record_date) = row.record_date else {
                return;
            };
            let record = ExchangeRate {
                currency: row.currency.unwrap_or_default(),
                exchange_rate: row.exchange_rate.unwrap_or_default(),
                record_date,
            };
            if seen.insert(record.clone()) {
                rates.push(record);
            }
        })
        .await?;

        if rates.is_empty() {
            return Err(RatesError::NoData);
        }
        rates.sort_by(|a, b| {
            a.currency
                .cmp(&b.currency)
                .then(a.record_date.cmp(&b.record_date))
        });
        Ok(rates)
    }

    /// Follows `links.next` cursors from `base_url`, feeding every row to
    /// `on_row`, until the series ends, the page cap trips, or a next link
    /// points back at an already-fetched URL (treated as end of series).
    async fn walk_pages<F>(
        &self,
        base_url: &str,
        mut cancel: watch::Receiver<bool>,
        mut on_row: F,
    ) -> ResultRates<()>
    where
        F: FnMut(RateRow),
    {
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages_fetched = 0u32;
        let mut current_url = Some(base_url.to_string());

        while let Some(url) = current_url {
            if *cancel.borrow() {
                return Err(RatesError::Cancelled);
            }
            if pages_fetched >= MAX_PAGE_LOOPS {
                return Err(RatesError::PageLimitExceeded(MAX_PAGE_LOOPS));
            }
            if !visited.insert(url.clone()) {
                break;
            }
            pages_fetched += 1;

            let page = self.fetch_page(&url, &mut cancel).await?;
            let rows = page.data.as_ref().ok_or(RatesError::NoData)?;
            tracing::debug!(%url, rows = rows.len(), "fetched rates page");

            let next = page
                .next_fragment()
                .map(|fragment| format!("{base_url}{fragment}"));
            if let Some(rows) = page.data {
                for row in rows {
                    on_row(row);
                }
            }
            current_url = next;
        }

        Ok(())
    }

    async fn fetch_page(
        &self,
        url: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> ResultRates<RatesPage> {
        let response = tokio::select! {
            biased;
            Ok(_) = cancel.wait_for(|cancelled| *cancelled) => {
                return Err(RatesError::Cancelled);
            }
            response = self.http.get(url).send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::Transport(status.as_u16()));
        }

        let page = tokio::select! {
            biased;
            Ok(_) = cancel.wait_for(|cancelled| *cancelled) => {
                return Err(RatesError::Cancelled);
            }
            page = response.json::<RatesPage>() => page?,
        };
        Ok(page)
    }
}

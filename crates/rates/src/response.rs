//! Wire shape of one page of the Treasury "Rates of Exchange" resource.
//!
//! The envelope is a `data` array plus a `links.next` cursor fragment; a
//! blank or absent fragment means the series is exhausted. `exchange_rate`
//! arrives as a JSON string and is parsed as a decimal.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RatesPage {
    #[serde(default)]
    pub data: Option<Vec<RateRow>>,
    #[serde(default)]
    pub links: Option<PageLinks>,
}

impl RatesPage {
    /// The fragment to append to the base URL for the next page, if any.
    pub fn next_fragment(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.next.as_deref())
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

/// One row of a page. The populated fields depend on the `fields=` selection
/// of the endpoint, so everything is optional here.
#[derive(Debug, Deserialize)]
pub(crate) struct RateRow {
    #[serde(default, rename = "country_currency_desc")]
    pub currency: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub record_date: Option<NaiveDate>,
}

//! The module contains the errors the ingestion client can return.
//!
//! Every failure is terminal for the call that produced it; the client never
//! retries on its own.
use thiserror::Error;

/// Ingestion client custom errors.
#[derive(Error, Debug)]
pub enum RatesError {
    #[error("min date cannot be greater than max date")]
    InvalidRange,
    #[error("exceeded maximum page loop limit: {0}")]
    PageLimitExceeded(u32),
    #[error("no exchange rate data returned")]
    NoData,
    #[error("HTTP {0}")]
    Transport(u16),
    #[error("failed to deserialize rates response: {0}")]
    Decode(String),
    #[error("operation canceled")]
    Cancelled,
    #[error("error retrieving exchange rate data: {0}")]
    Other(String),
}

impl From<reqwest::Error> for RatesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Transport(status.as_u16())
        } else {
            Self::Other(err.to_string())
        }
    }
}

impl PartialEq for RatesError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRange, Self::InvalidRange) => true,
            (Self::PageLimitExceeded(a), Self::PageLimitExceeded(b)) => a == b,
            (Self::NoData, Self::NoData) => true,
            (Self::Transport(a), Self::Transport(b)) => a == b,
            (Self::Decode(a), Self::Decode(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            (Self::Other(a), Self::Other(b)) => a == b,
            _ => false,
        }
    }
}

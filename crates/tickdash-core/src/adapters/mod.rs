//! Market-data source adapters.

pub mod yahoo;

pub use yahoo::{YahooAdapter, YAHOO_BASE_URL};

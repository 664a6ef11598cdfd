//! Client for the options-chain quote source
//!
//! Fetches an options chain from Alpha Vantage and materialises it as a CSV
//! file for the surface pipeline.

mod rest;

pub use rest::{parse_chain_response, QuoteClient};

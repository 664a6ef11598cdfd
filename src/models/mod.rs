//! Data models for options chains and volatility surfaces
//!
//! This module contains data structures for representing chain records as
//! delivered by the quote source, and the surface points derived from them.

mod option;
mod volatility;

pub use option::*;
pub use volatility::*;

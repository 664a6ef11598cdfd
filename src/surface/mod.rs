//! Implied volatility surface extraction and plotting
//!
//! Reads options-chain CSV files, turns qualifying rows into call and put
//! surface points, and drives a [`SurfaceRenderer`](crate::render::SurfaceRenderer)
//! to draw one PNG per option type.

mod extractor;
mod pipeline;

pub use extractor::*;
pub use pipeline::{BatchReport, PlotOutcome, SurfacePlotter};

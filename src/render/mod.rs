//! Surface renderers
//!
//! A renderer turns a point file into a PNG. The pipeline only talks to the
//! [`SurfaceRenderer`] trait so backends can be swapped without touching
//! extraction.

mod gnuplot;
mod heatmap;

pub use gnuplot::{surface_script, GnuplotRenderer};
pub use heatmap::PlottersRenderer;

use crate::config::{RendererConfig, RendererKind};
use crate::error::Result;
use std::path::Path;

/// One surface to draw
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Human readable plot title, e.g. "Call IV Surface"
    pub title: &'a str,
    /// Space-delimited `strike tte iv` point file
    pub data_path: &'a Path,
    /// PNG to produce
    pub output_path: &'a Path,
}

pub trait SurfaceRenderer {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Draw the job's points into its output image, blocking until done.
    fn render(&self, job: &RenderJob<'_>) -> Result<()>;
}

/// Build the renderer selected by configuration
pub fn renderer_from_config(config: &RendererConfig) -> Box<dyn SurfaceRenderer> {
    match config.kind {
        RendererKind::Gnuplot => Box::new(GnuplotRenderer::new(&config.program, config.timeout())),
        RendererKind::Plotters => Box::new(PlottersRenderer::default()),
    }
}

use super::{RenderJob, SurfaceRenderer};
use crate::error::Result;
use crate::utils::plotting::plot_iv_surface;
use crate::utils::read_point_file;
use tracing::info;

/// Renders in-process with plotters as an interpolated heat map
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    /// Grid nodes along the strike axis
    pub strike_nodes: usize,
    /// Grid nodes along the time axis
    pub time_nodes: usize,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            strike_nodes: 60,
            time_nodes: 40,
        }
    }
}

impl SurfaceRenderer for PlottersRenderer {
    fn name(&self) -> &'static str {
        "plotters"
    }

    fn render(&self, job: &RenderJob<'_>) -> Result<()> {
        let points = read_point_file(job.data_path)?;
        plot_iv_surface(
            &points,
            job.title,
            self.strike_nodes,
            self.time_nodes,
            job.output_path,
        )?;
        info!("{} written", job.output_path.display());
        Ok(())
    }
}

use crate::error::{OptionsError, Result};
use crate::models::{IvGrid, SurfacePoint};
use image::ImageFormat;
use plotters::backend::BitMapBackend;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 900;
const COLOR_GRADIENT: colorous::Gradient = colorous::VIRIDIS;

/// Axis range around `[min, max]`, widened when the data has no extent
fn axis_range(min: f64, max: f64) -> Range<f64> {
    if max > min {
        min..max
    } else {
        let pad = (min.abs() * 0.05).max(0.01);
        (min - pad)..(max + pad)
    }
}

/// Half-width of a grid cell along one axis
fn half_cell(axis: &[f64], range: &Range<f64>) -> f64 {
    let step = if axis.len() > 1 {
        (axis[axis.len() - 1] - axis[0]) / (axis.len() - 1) as f64
    } else {
        0.0
    };
    if step > 0.0 {
        0.5 * step
    } else {
        0.5 * (range.end - range.start)
    }
}

/// Position of `vol` within `[vol_min, vol_max]`, clamped to `[0, 1]`
fn normalize(vol: f64, vol_min: f64, vol_max: f64) -> f64 {
    if vol_max > vol_min {
        ((vol - vol_min) / (vol_max - vol_min)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Heat map of IV over strike x time to expiration, interpolated onto a grid
pub fn plot_iv_surface<P: AsRef<Path>>(
    points: &[SurfacePoint],
    title: &str,
    n_strikes: usize,
    n_times: usize,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let grid = IvGrid::interpolate(points, n_strikes, n_times)?;

    let buffer = draw_iv_surface(&grid, points, title)?;
    image::save_buffer_with_format(
        output_path,
        &buffer,
        WIDTH,
        HEIGHT,
        image::ColorType::Rgb8,
        ImageFormat::Png,
    )
    .map_err(|e| OptionsError::RenderError(format!("Failed to save {}: {}", output_path.display(), e)))?;

    Ok(())
}

fn draw_iv_surface(grid: &IvGrid, points: &[SurfacePoint], title: &str) -> Result<Vec<u8>> {
    let strike_range = axis_range(grid.strikes[0], grid.strikes[grid.strikes.len() - 1]);
    let time_range = axis_range(grid.times[0], grid.times[grid.times.len() - 1]);
    let (vol_min, vol_max) = grid.vol_bounds();

    let half_strike = half_cell(&grid.strikes, &strike_range);
    let half_time = half_cell(&grid.times, &time_range);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        let (plot_area, legend_area) = root.split_horizontally(WIDTH - 140);

        let mut chart = ChartBuilder::on(&plot_area)
            .caption(title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (strike_range.start - half_strike)..(strike_range.end + half_strike),
                (time_range.start - half_time)..(time_range.end + half_time),
            )
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Strike")
            .y_desc("Time to Expiration (Years)")
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        let mut cells = Vec::with_capacity(grid.times.len() * grid.strikes.len());
        for (i, &time) in grid.times.iter().enumerate() {
            for (j, &strike) in grid.strikes.iter().enumerate() {
                let vol = grid.volatilities[[i, j]];
                if vol.is_nan() {
                    continue;
                }
                let color = COLOR_GRADIENT.eval_continuous(normalize(vol, vol_min, vol_max));
                cells.push(Rectangle::new(
                    [
                        (strike - half_strike, time - half_time),
                        (strike + half_strike, time + half_time),
                    ],
                    RGBColor(color.r, color.g, color.b).filled(),
                ));
            }
        }
        chart
            .draw_series(cells)
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        // sampled contracts on top of the interpolated field
        chart
            .draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p.strike, p.time_to_expiration), 2, BLACK.filled())),
            )
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        let color_bar_width = 20;
        let color_bar_height = 500;
        let color_bar_x = 30;
        let color_bar_y = 150;

        for i in 0..color_bar_height {
            let normalized_pos = 1.0 - (i as f64 / color_bar_height as f64);
            let color = COLOR_GRADIENT.eval_continuous(normalized_pos);
            legend_area
                .draw(&Rectangle::new(
                    [
                        (color_bar_x, color_bar_y + i),
                        (color_bar_x + color_bar_width, color_bar_y + i + 1),
                    ],
                    RGBColor(color.r, color.g, color.b).filled(),
                ))
                .map_err(|e| OptionsError::RenderError(e.to_string()))?;
        }

        let label_style = TextStyle::from(("sans-serif", 12)).color(&BLACK);
        legend_area
            .draw_text(
                &format!("{:.3}", vol_max),
                &label_style,
                (color_bar_x + color_bar_width + 5, color_bar_y),
            )
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;
        legend_area
            .draw_text(
                &format!("{:.3}", vol_min),
                &label_style,
                (color_bar_x + color_bar_width + 5, color_bar_y + color_bar_height),
            )
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;
        legend_area
            .draw_text(
                "Implied Volatility",
                &label_style,
                (color_bar_x - 10, color_bar_y - 25),
            )
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;

        root.present()
            .map_err(|e| OptionsError::RenderError(e.to_string()))?;
    }

    Ok(buffer)
}

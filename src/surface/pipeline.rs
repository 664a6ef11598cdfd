use super::extract_points;
use crate::config::Config;
use crate::error::{OptionsError, Result};
use crate::models::OptionType;
use crate::render::{renderer_from_config, RenderJob, SurfaceRenderer};
use crate::utils::write_point_file;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result of plotting one chain file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    /// Every row was filtered out; nothing was written or rendered
    NoValidPoints,
    /// PNGs produced, calls first
    Rendered(Vec<PathBuf>),
}

/// Summary of a batch of chain files
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    pub empty: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, OptionsError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Extracts IV points from chain CSVs and hands them to a renderer
pub struct SurfacePlotter {
    output_dir: PathBuf,
    renderer: Box<dyn SurfaceRenderer>,
}

impl SurfacePlotter {
    pub fn new<P: Into<PathBuf>>(output_dir: P, renderer: Box<dyn SurfaceRenderer>) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output_dir.clone(),
            renderer_from_config(&config.renderer),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn base_name(csv_path: &Path) -> String {
        csv_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chain".to_string())
    }

    /// Scratch point file, e.g. `output/SPYoptions_call_points.dat`
    pub fn point_file_path(&self, csv_path: &Path, option_type: OptionType) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_points.dat",
            Self::base_name(csv_path),
            option_type.as_str()
        ))
    }

    /// Rendered image, e.g. `output/SPYoptions_call_ivsurface.png`
    pub fn image_path(&self, csv_path: &Path, option_type: OptionType) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_ivsurface.png",
            Self::base_name(csv_path),
            option_type.as_str()
        ))
    }

    /// Extract points from one chain CSV and render a surface per option type.
    pub fn plot_csv<P: AsRef<Path>>(&self, csv_path: P) -> Result<PlotOutcome> {
        let mut images = Vec::new();
        match self.render_csv(csv_path.as_ref(), &mut images)? {
            true => Ok(PlotOutcome::Rendered(images)),
            false => Ok(PlotOutcome::NoValidPoints),
        }
    }

    /// Render every non-empty point set of `csv_path`, pushing each finished
    /// image onto `images` as it lands. On error, images already pushed stay
    /// on disk and in `images`. Returns false when no row qualified.
    fn render_csv(&self, csv_path: &Path, images: &mut Vec<PathBuf>) -> Result<bool> {
        let points = extract_points(csv_path)?;

        if points.is_empty() {
            info!("{}: no valid points", csv_path.display());
            return Ok(false);
        }

        fs::create_dir_all(&self.output_dir)?;

        for option_type in [OptionType::Call, OptionType::Put] {
            let set = points.get(option_type);
            if set.is_empty() {
                debug!("{}: no {} points", csv_path.display(), option_type.as_str());
                continue;
            }

            let data_path = self.point_file_path(csv_path, option_type);
            let output_path = self.image_path(csv_path, option_type);
            if let Err(e) = write_point_file(&data_path, set) {
                remove_scratch(&data_path);
                return Err(e);
            }
            info!(
                "Wrote {} {} points to {}",
                set.len(),
                option_type.as_str(),
                data_path.display()
            );

            let title = format!("{} IV Surface", option_type);
            let result = self.renderer.render(&RenderJob {
                title: &title,
                data_path: &data_path,
                output_path: &output_path,
            });
            remove_scratch(&data_path);
            result?;

            images.push(output_path);
        }

        Ok(true)
    }

    /// Plot several chain files.
    ///
    /// A configuration error (such as a missing column) stops the batch;
    /// any other per-file failure is recorded and the batch moves on. Images
    /// a failed file produced before its failure are still listed in
    /// `rendered`.
    pub fn plot_batch<P: AsRef<Path>>(&self, csv_paths: &[P]) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for csv_path in csv_paths {
            let csv_path = csv_path.as_ref();
            let mut images = Vec::new();
            let result = self.render_csv(csv_path, &mut images);
            report.rendered.extend(images);
            match result {
                Ok(true) => {}
                Ok(false) => report.empty.push(csv_path.to_path_buf()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("{}: {}", csv_path.display(), e);
                    report.failures.push((csv_path.to_path_buf(), e));
                }
            }
        }

        info!(
            "Batch done using {}: {} images, {} empty, {} failed",
            self.renderer.name(),
            report.rendered.len(),
            report.empty.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

fn remove_scratch(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

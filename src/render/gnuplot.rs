use super::{RenderJob, SurfaceRenderer};
use crate::error::{OptionsError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Quote a value as a gnuplot single-quoted string
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// gnuplot script drawing a grid-interpolated IV surface from a point file.
///
/// The scattered points are resampled onto a regular strike x time grid
/// (`dgrid3d`, inverse-distance `qnorm 2`) and shaded by IV with a fixed
/// blue-to-red palette.
pub fn surface_script(output_path: &Path, title: &str, data_path: &Path) -> String {
    format!(
        "set terminal png size 1200,900 noenhanced\n\
         set output {output}\n\
         set title {title}\n\
         set xlabel 'Strike'\n\
         set ylabel 'Time to Expiration (Years)'\n\
         set zlabel 'Implied Volatility' rotate parallel\n\
         set dgrid3d 50,50 qnorm 2\n\
         set pm3d at s\n\
         set palette defined (0 'dark-blue', 1 'blue', 2 'cyan', 3 'yellow', 4 'red')\n\
         set cblabel 'Implied Volatility'\n\
         set view 60,30\n\
         unset key\n\
         splot {data} using 1:2:3 with pm3d\n",
        output = quote(&output_path.to_string_lossy()),
        title = quote(title),
        data = quote(&data_path.to_string_lossy()),
    )
}

/// Renders through an external gnuplot process
#[derive(Debug, Clone)]
pub struct GnuplotRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl GnuplotRenderer {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Arguments placed before the script path, for wrappers around gnuplot
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Script written next to the point file, e.g. `SPY_call_points.gp`
    pub fn script_path(data_path: &Path) -> PathBuf {
        data_path.with_extension("gp")
    }

    /// Run the renderer to completion on a private current-thread runtime
    fn run(&self, script_path: &Path) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async(script_path))
    }

    async fn run_async(&self, script_path: &Path) -> Result<()> {
        debug!("Running {} {:?} {}", self.program, self.args, script_path.display());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(script_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OptionsError::RenderError(format!("Failed to launch '{}': {}", self.program, e))
            })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!("{} exceeded {:?}, killing it", self.program, self.timeout);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", self.program, e);
                }
                return Err(OptionsError::RenderError(format!(
                    "'{}' timed out after {:?}",
                    self.program, self.timeout
                )));
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(OptionsError::RenderError(format!(
                "'{}' exited with {}",
                self.program, status
            )))
        }
    }
}

impl SurfaceRenderer for GnuplotRenderer {
    fn name(&self) -> &'static str {
        "gnuplot"
    }

    fn render(&self, job: &RenderJob<'_>) -> Result<()> {
        let script_path = Self::script_path(job.data_path);
        fs::write(
            &script_path,
            surface_script(job.output_path, job.title, job.data_path),
        )?;

        let result = self.run(&script_path);

        match fs::remove_file(&script_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", script_path.display(), e),
        }

        if result.is_ok() {
            info!("{} written", job.output_path.display());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::tempdir;

    #[test]
    fn script_substitutes_paths_and_title() {
        let script = surface_script(
            Path::new("output/SPY_call_ivsurface.png"),
            "Call IV Surface",
            Path::new("output/SPY_call_points.dat"),
        );
        assert!(script.contains("set output 'output/SPY_call_ivsurface.png'\n"));
        assert!(script.contains("set title 'Call IV Surface'\n"));
        assert!(script.contains("splot 'output/SPY_call_points.dat' using 1:2:3 with pm3d\n"));
        assert!(script.contains("set xlabel 'Strike'"));
        assert!(script.contains("set ylabel 'Time to Expiration (Years)'"));
        assert!(script.contains("set zlabel 'Implied Volatility'"));
        assert!(script.contains("set dgrid3d"));
        assert!(script.contains("set palette defined"));
    }

    #[test]
    fn script_uses_the_stock_png_terminal() {
        let script = surface_script(
            Path::new("out.png"),
            "Put IV Surface",
            Path::new("points.dat"),
        );
        assert!(script.starts_with("set terminal png size 1200,900"));
        assert!(!script.contains("pngcairo"));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote("it's"), "'it''s'");
    }

    #[test]
    fn script_lives_next_to_points() {
        assert_eq!(
            GnuplotRenderer::script_path(Path::new("out/SPY_put_points.dat")),
            PathBuf::from("out/SPY_put_points.gp")
        );
    }

    #[test]
    fn launch_failure_is_render_error() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("x_call_points.dat");
        fs::write(&data, "100 1 0.2\n").unwrap();
        let out = dir.path().join("x.png");

        let renderer = GnuplotRenderer::new("ivsurf-no-such-program", Duration::from_secs(5));
        let err = renderer
            .render(&RenderJob {
                title: "Call IV Surface",
                data_path: &data,
                output_path: &out,
            })
            .unwrap_err();
        assert!(matches!(err, OptionsError::RenderError(_)));
        assert!(!GnuplotRenderer::script_path(&data).exists());
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("x_call_points.dat");
        fs::write(&data, "100 1 0.2\n").unwrap();
        let out = dir.path().join("x.png");
        let job = RenderJob {
            title: "Call IV Surface",
            data_path: &data,
            output_path: &out,
        };

        let ok = GnuplotRenderer::new("true", Duration::from_secs(5));
        assert!(ok.render(&job).is_ok());
        assert!(!GnuplotRenderer::script_path(&data).exists());

        let failing = GnuplotRenderer::new("false", Duration::from_secs(5));
        assert!(matches!(failing.render(&job), Err(OptionsError::RenderError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn hung_renderer_is_killed() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("x_put_points.dat");
        fs::write(&data, "100 1 0.2\n").unwrap();
        let out = dir.path().join("x.png");

        let renderer = GnuplotRenderer::new("sh", Duration::from_millis(200))
            .with_args(["-c", "sleep 10", "sh"]);
        let started = Instant::now();
        let err = renderer
            .render(&RenderJob {
                title: "Put IV Surface",
                data_path: &data,
                output_path: &out,
            })
            .unwrap_err();
        assert!(matches!(err, OptionsError::RenderError(ref m) if m.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

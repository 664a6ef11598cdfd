use crate::error::{OptionsError, Result};
use crate::models::SurfacePoint;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write points one per line as `strike tte iv`
pub fn write_point_file<P: AsRef<Path>>(path: P, points: &[SurfacePoint]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for point in points {
        writeln!(out, "{}", point.to_line())?;
    }
    out.flush()?;
    Ok(())
}

/// Read a point file written by [`write_point_file`]
pub fn read_point_file<P: AsRef<Path>>(path: P) -> Result<Vec<SurfacePoint>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let fields: Vec<f64> = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| {
                    OptionsError::ParseError(format!("{}:{}: {}", path.display(), i + 1, e))
                })?;
            match fields.as_slice() {
                [strike, tte, iv] => Ok(SurfacePoint::new(*strike, *tte, *iv)),
                _ => Err(OptionsError::ParseError(format!(
                    "{}:{}: expected 3 fields, found {}",
                    path.display(),
                    i + 1,
                    fields.len()
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lines_are_space_separated_and_newline_terminated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SPY_call_points.dat");
        let points = vec![
            SurfacePoint::new(100.0, 0.5, 0.2),
            SurfacePoint::new(102.5, 1.0, 0.235),
        ];
        write_point_file(&path, &points).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "100 0.5 0.2\n102.5 1 0.235\n");
        assert_eq!(read_point_file(&path).unwrap(), points);
    }

    #[test]
    fn malformed_line_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.dat");
        fs::write(&path, "100 0.5\n").unwrap();
        assert!(matches!(read_point_file(&path), Err(OptionsError::ParseError(_))));
    }
}

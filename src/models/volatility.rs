//! Implied volatility surface points and grids
//!
//! This module contains the per-contract surface point extracted from a chain
//! file and the regular grid interpolated from a scattered set of points.

use crate::error::{OptionsError, Result};
use crate::models::option::OptionType;
use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: f64 = 365.0;

/// Time to expiration in years between an as-of date and an expiration date.
///
/// Measured in whole calendar days over a 365 day year. Negative when the
/// expiration precedes the as-of date.
pub fn time_to_expiration(as_of: NaiveDate, expiration: NaiveDate) -> f64 {
    (expiration - as_of).num_days() as f64 / DAYS_PER_YEAR
}

/// A single point on an IV surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Strike price
    pub strike: f64,
    /// Time to expiration in years
    pub time_to_expiration: f64,
    /// Implied volatility as a fraction (0.2 == 20%)
    pub implied_vol: f64,
}

impl SurfacePoint {
    pub fn new(strike: f64, time_to_expiration: f64, implied_vol: f64) -> Self {
        Self {
            strike,
            time_to_expiration,
            implied_vol,
        }
    }

    /// Point-file line: `strike tte iv`, shortest round-trip decimals
    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.strike, self.time_to_expiration, self.implied_vol)
    }
}

/// Surface points of one chain file split by option type, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoints {
    pub calls: Vec<SurfacePoint>,
    pub puts: Vec<SurfacePoint>,
}

impl SurfacePoints {
    pub fn push(&mut self, option_type: OptionType, point: SurfacePoint) {
        match option_type {
            OptionType::Call => self.calls.push(point),
            OptionType::Put => self.puts.push(point),
        }
    }

    pub fn get(&self, option_type: OptionType) -> &[SurfacePoint] {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }
}

/// Regular strike x time grid interpolated from scattered surface points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvGrid {
    /// Strike axis, ascending
    pub strikes: Vec<f64>,
    /// Time-to-expiration axis, ascending
    pub times: Vec<f64>,
    /// Implied volatility values (2D array: times x strikes)
    pub volatilities: Array2<f64>,
}

impl IvGrid {
    /// Interpolate scattered points onto an `n_times` x `n_strikes` grid.
    ///
    /// Uses inverse-distance weighting with power 2 on axes normalised to
    /// their own span, the same smoothing gnuplot's `dgrid3d ... qnorm 2`
    /// applies. A grid node that coincides with a sample takes its value.
    pub fn interpolate(points: &[SurfacePoint], n_strikes: usize, n_times: usize) -> Result<Self> {
        if points.is_empty() {
            return Err(OptionsError::Other(
                "Cannot interpolate a surface from empty data".to_string(),
            ));
        }
        if n_strikes < 2 || n_times < 2 {
            return Err(OptionsError::Other(
                "Grid needs at least two nodes per axis".to_string(),
            ));
        }

        let (min_strike, max_strike) = bounds(points.iter().map(|p| p.strike));
        let (min_time, max_time) = bounds(points.iter().map(|p| p.time_to_expiration));
        let strikes = linspace(min_strike, max_strike, n_strikes);
        let times = linspace(min_time, max_time, n_times);

        let strike_span = span(min_strike, max_strike);
        let time_span = span(min_time, max_time);

        let mut volatilities = Array2::from_elem((n_times, n_strikes), f64::NAN);
        for (i, &t) in times.iter().enumerate() {
            for (j, &k) in strikes.iter().enumerate() {
                let mut weighted = 0.0;
                let mut total = 0.0;
                let mut exact = None;
                for p in points {
                    let dk = (p.strike - k) / strike_span;
                    let dt = (p.time_to_expiration - t) / time_span;
                    let dist2 = dk * dk + dt * dt;
                    if dist2 < 1e-18 {
                        exact = Some(p.implied_vol);
                        break;
                    }
                    let w = 1.0 / dist2;
                    weighted += w * p.implied_vol;
                    total += w;
                }
                volatilities[[i, j]] = exact.unwrap_or(weighted / total);
            }
        }

        Ok(Self {
            strikes,
            times,
            volatilities,
        })
    }

    /// Smallest and largest interpolated volatility
    pub fn vol_bounds(&self) -> (f64, f64) {
        bounds(self.volatilities.iter().copied().filter(|v| !v.is_nan()))
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn span(min: f64, max: f64) -> f64 {
    let s = max - min;
    if s > 0.0 {
        s
    } else {
        1.0
    }
}

fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| min + (max - min) * i as f64 / (n - 1) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn one_year_to_expiration() {
        let t = time_to_expiration(date("2025-01-01"), date("2026-01-01"));
        assert!((t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn leap_year_counts_calendar_days() {
        let t = time_to_expiration(date("2024-01-01"), date("2025-01-01"));
        assert!((t - 366.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn expired_contract_is_negative() {
        assert!(time_to_expiration(date("2025-06-20"), date("2025-01-01")) < 0.0);
        assert_eq!(time_to_expiration(date("2025-01-01"), date("2025-01-01")), 0.0);
    }

    #[test]
    fn point_line_uses_shortest_decimals() {
        let p = SurfacePoint::new(100.0, 1.0, 0.2);
        assert_eq!(p.to_line(), "100 1 0.2");
        let p = SurfacePoint::new(412.5, 0.5, 0.235);
        assert_eq!(p.to_line(), "412.5 0.5 0.235");
    }

    #[test]
    fn points_route_by_type() {
        let mut set = SurfacePoints::default();
        assert!(set.is_empty());
        set.push(OptionType::Put, SurfacePoint::new(90.0, 0.5, 0.3));
        set.push(OptionType::Call, SurfacePoint::new(110.0, 0.5, 0.2));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(OptionType::Call)[0].strike, 110.0);
        assert_eq!(set.get(OptionType::Put)[0].strike, 90.0);
    }

    #[test]
    fn grid_reproduces_samples_at_corners() {
        let points = vec![
            SurfacePoint::new(90.0, 0.25, 0.30),
            SurfacePoint::new(110.0, 0.25, 0.20),
            SurfacePoint::new(90.0, 1.0, 0.28),
            SurfacePoint::new(110.0, 1.0, 0.22),
        ];
        let grid = IvGrid::interpolate(&points, 5, 4).unwrap();
        assert_eq!(grid.volatilities.dim(), (4, 5));
        assert_eq!(grid.strikes.first(), Some(&90.0));
        assert_eq!(grid.strikes.last(), Some(&110.0));
        assert!((grid.volatilities[[0, 0]] - 0.30).abs() < 1e-12);
        assert!((grid.volatilities[[3, 4]] - 0.22).abs() < 1e-12);

        let (lo, hi) = grid.vol_bounds();
        assert!(lo >= 0.20 - 1e-12 && hi <= 0.30 + 1e-12);
    }

    #[test]
    fn grid_handles_single_expiration() {
        let points = vec![
            SurfacePoint::new(90.0, 0.5, 0.3),
            SurfacePoint::new(110.0, 0.5, 0.2),
        ];
        let grid = IvGrid::interpolate(&points, 3, 2).unwrap();
        assert!(grid.volatilities.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn grid_rejects_empty_input() {
        assert!(IvGrid::interpolate(&[], 10, 10).is_err());
    }
}

//! Speed-to-power estimation for fixed-resistance trainers.
//!
//! A dumb trainer's power output is a fixed function of wheel speed, so
//! a measured curve (speed km/h, watts) sampled into a CSV file is
//! enough to estimate power from the live speed reading.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// A monotone speed→power lookup table with linear interpolation.
#[derive(Debug, Clone)]
pub struct PowerCurve {
    /// (speed_kmh, watts) points sorted by speed
    points: Vec<(f64, f64)>,
}

impl PowerCurve {
    /// Build a curve from (speed_kmh, watts) points.
    ///
    /// Points are sorted by speed; at least one is required.
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            bail!("power curve needs at least one point");
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { points })
    }

    /// Load a curve from a two-column CSV file (`speed_kmh,watts` per
    /// line, no header).
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading power curve {}", path.display()))?;
        Self::from_csv(&text).with_context(|| format!("parsing power curve {}", path.display()))
    }

    /// Parse CSV text into a curve. Blank lines are skipped.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut points = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let speed: f64 = fields
                .next()
                .and_then(|f| f.trim().parse().ok())
                .with_context(|| format!("line {}: bad speed value", lineno + 1))?;
            let watts: f64 = fields
                .next()
                .and_then(|f| f.trim().parse().ok())
                .with_context(|| format!("line {}: bad watts value", lineno + 1))?;
            points.push((speed, watts));
        }
        Self::new(points)
    }

    /// Estimate power at the given speed.
    ///
    /// Linear interpolation between neighboring points; speeds outside
    /// the table clamp to the endpoint values.
    pub fn estimate(&self, speed_kmh: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if speed_kmh <= first.0 {
            return first.1;
        }
        if speed_kmh >= last.0 {
            return last.1;
        }

        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if speed_kmh <= x1 {
                if x1 == x0 {
                    return y1;
                }
                let t = (speed_kmh - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        last.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> PowerCurve {
        PowerCurve::new(vec![(10.0, 50.0), (20.0, 120.0), (30.0, 240.0)]).unwrap()
    }

    #[test]
    fn test_interpolates_between_points() {
        let c = curve();
        assert!((c.estimate(15.0) - 85.0).abs() < 1e-9);
        assert!((c.estimate(25.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_at_endpoints() {
        let c = curve();
        assert_eq!(c.estimate(5.0), 50.0);
        assert_eq!(c.estimate(40.0), 240.0);
    }

    #[test]
    fn test_exact_points() {
        let c = curve();
        assert_eq!(c.estimate(20.0), 120.0);
    }

    #[test]
    fn test_csv_parsing() {
        let c = PowerCurve::from_csv("10.0, 50\n20.0, 120\n\n30.0, 240\n").unwrap();
        assert!((c.estimate(15.0) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_csv_rejects_garbage() {
        assert!(PowerCurve::from_csv("not,a,number\n").is_err());
        assert!(PowerCurve::from_csv("").is_err());
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let c = PowerCurve::new(vec![(30.0, 240.0), (10.0, 50.0), (20.0, 120.0)]).unwrap();
        assert!((c.estimate(15.0) - 85.0).abs() < 1e-9);
    }
}

//! Scan-position to base-pair sizing.
//!
//! Two swappable strategies: the historical linear mapping, kept as the
//! default for behavioral compatibility, and a piecewise-linear curve fitted
//! through detected internal-lane-standard peaks.

use std::collections::BTreeMap;

use crate::{peak::Peak, trace::Channel};

#[derive(Debug, Clone, PartialEq)]
pub enum SizeCurve {
    Linear { intercept: f64, slope: f64 },
    Ladder(LadderCurve),
}

impl SizeCurve {
    /// The historical mapping: `100 + 0.1 * scan`.
    pub fn linear_default() -> Self {
        SizeCurve::Linear {
            intercept: 100.0,
            slope: 0.1,
        }
    }

    pub fn bp_at(&self, scan: usize) -> f64 {
        match self {
            SizeCurve::Linear { intercept, slope } => intercept + slope * scan as f64,
            SizeCurve::Ladder(curve) => curve.bp_at(scan as f64),
        }
    }
}

/// Piecewise-linear interpolation through `(scan, bp)` calibration points,
/// extrapolating along the edge segments outside the fitted range.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderCurve {
    /// Ascending by scan; at least two points.
    points: Vec<(f64, f64)>,
}

impl LadderCurve {
    /// Fit a curve from detected ladder peaks and the ladder's known
    /// fragment sizes. The tallest `fragment_sizes.len()` peaks are matched
    /// to the fragments in scan order. Returns `None` when too few peaks
    /// were detected or fewer than two fragments are given.
    pub fn fit(ladder_peaks: &[Peak], fragment_sizes: &[f64]) -> Option<Self> {
        if fragment_sizes.len() < 2 || ladder_peaks.len() < fragment_sizes.len() {
            return None;
        }
        // ladder_peaks arrive height-sorted from the detector
        let mut chosen: Vec<&Peak> = ladder_peaks.iter().take(fragment_sizes.len()).collect();
        chosen.sort_by_key(|p| p.scan);
        let points = chosen
            .iter()
            .zip(fragment_sizes)
            .map(|(peak, &bp)| (peak.scan as f64, bp))
            .collect();
        Some(Self { points })
    }

    pub fn bp_at(&self, scan: f64) -> f64 {
        let segment = self
            .points
            .windows(2)
            .find(|pair| scan <= pair[1].0)
            .unwrap_or_else(|| &self.points[self.points.len() - 2..]);
        let (scan0, bp0) = segment[0];
        let (scan1, bp1) = segment[1];
        bp0 + (scan - scan0) * (bp1 - bp0) / (scan1 - scan0)
    }
}

/// The active sizing curve for each channel.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    curves: BTreeMap<Channel, SizeCurve>,
}

impl Calibration {
    /// Linear default sizing on every standard channel.
    pub fn linear_default(channels: impl IntoIterator<Item = Channel>) -> Self {
        let curves = channels
            .into_iter()
            .map(|ch| (ch, SizeCurve::linear_default()))
            .collect();
        Self { curves }
    }

    pub fn with_curve(mut self, channel: Channel, curve: SizeCurve) -> Self {
        self.curves.insert(channel, curve);
        self
    }

    pub fn curve_for(&self, channel: Channel) -> Option<&SizeCurve> {
        self.curves.get(&channel)
    }
}

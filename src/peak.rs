//! Peak detection over a single channel trace.
//!
//! A peak is a strict local maximum over a `min_distance` window on both
//! sides; ties never qualify, and positions within `min_distance` of either
//! trace end are never evaluated.

use itertools::Itertools;
use serde::Deserialize;

use crate::trace::{Channel, Trace};

/// Neighborhood radius for the fraction-of-max noise filter, in scans.
const LOCAL_MAX_RADIUS: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PeakParams {
    pub min_distance: usize,
    /// Half-width of the trapezoidal area window, in scans.
    pub area_window: usize,
    /// When set, peaks below this fraction of the tallest peak within
    /// ±100 scans are marked non-compliant (kept, never removed).
    pub fraction_of_max: Option<f64>,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            min_distance: 5,
            area_window: 20,
            fraction_of_max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub scan: usize,
    pub height: i16,
    /// Trapezoidal integral of the trace over the area window.
    pub area: f64,
    /// Full width at half maximum, in scans.
    pub width: f64,
    pub channel: Channel,
    /// False when the fraction-of-max filter judged this peak co-eluting
    /// noise next to a strong peak.
    pub compliant: bool,
}

/// Detect peaks in a trace, returned in descending height order.
///
/// `min_height` is the signal floor; the pipeline supplies it from the
/// configured `min_rfu` threshold.
pub fn detect_peaks(trace: &Trace, min_height: i16, params: &PeakParams) -> Vec<Peak> {
    let samples = &trace.samples;
    let d = params.min_distance.max(1);
    let mut peaks = Vec::new();
    if samples.len() < 2 * d + 1 {
        return peaks;
    }
    for i in d..samples.len() - d {
        if samples[i] < min_height {
            continue;
        }
        let strict_max =
            (1..=d).all(|j| samples[i] > samples[i - j] && samples[i] > samples[i + j]);
        if !strict_max {
            continue;
        }
        peaks.push(Peak {
            scan: i,
            height: samples[i],
            area: trapezoid_area(samples, i, params.area_window),
            width: half_max_width(samples, i),
            channel: trace.channel,
            compliant: true,
        });
    }

    if let Some(fraction) = params.fraction_of_max {
        flag_noncompliant(&mut peaks, fraction);
    }

    peaks.sort_by(|a, b| b.height.cmp(&a.height));
    peaks
}

fn trapezoid_area(samples: &[i16], center: usize, window: usize) -> f64 {
    let lo = center.saturating_sub(window);
    let hi = (center + window).min(samples.len() - 1);
    samples[lo..=hi]
        .iter()
        .tuple_windows()
        .map(|(a, b)| (*a as f64 + *b as f64) / 2.0)
        .sum()
}

/// Scan outward from the apex until the trace falls to half height on each
/// side; the width is the sum of the two distances. A side that never falls
/// contributes its distance to the trace end.
fn half_max_width(samples: &[i16], center: usize) -> f64 {
    let half = samples[center] as f64 / 2.0;
    let mut left = 0usize;
    for j in (0..center).rev() {
        left = center - j;
        if (samples[j] as f64) <= half {
            break;
        }
    }
    let mut right = 0usize;
    for j in center + 1..samples.len() {
        right = j - center;
        if (samples[j] as f64) <= half {
            break;
        }
    }
    (left + right) as f64
}

fn flag_noncompliant(peaks: &mut [Peak], fraction: f64) {
    let snapshot: Vec<(usize, i16)> = peaks.iter().map(|p| (p.scan, p.height)).collect();
    for peak in peaks.iter_mut() {
        let local_max = snapshot
            .iter()
            .filter(|(scan, _)| scan.abs_diff(peak.scan) <= LOCAL_MAX_RADIUS)
            .map(|&(_, height)| height)
            .max()
            .unwrap_or(peak.height);
        if (peak.height as f64) < fraction * local_max as f64 {
            peak.compliant = false;
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn trace_of(samples: Vec<i16>) -> Trace {
        Trace {
            channel: Channel(1),
            dye: "6-FAM".to_string(),
            samples,
        }
    }

    fn params(min_distance: usize) -> PeakParams {
        PeakParams {
            min_distance,
            ..PeakParams::default()
        }
    }

    #[test]
    fn test_single_spike() {
        let mut samples = vec![0i16; 100];
        samples[50] = 500;
        let peaks = detect_peaks(&trace_of(samples), 150, &params(10));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].scan, 50);
        assert_eq!(peaks[0].height, 500);
    }

    #[test]
    fn test_spike_area_and_width() {
        let mut samples = vec![0i16; 100];
        samples[50] = 500;
        let peaks = detect_peaks(&trace_of(samples), 150, &params(10));
        // trapezoid over the two flanking intervals: 250 + 250
        assert_eq!(peaks[0].area, 500.0);
        // both neighbors are already below half height
        assert_eq!(peaks[0].width, 2.0);
    }

    #[test]
    fn test_tie_is_not_a_peak() {
        let mut samples = vec![0i16; 60];
        samples[30] = 400;
        samples[31] = 400;
        assert!(detect_peaks(&trace_of(samples), 150, &params(5)).is_empty());
    }

    #[test]
    fn test_edges_never_evaluated() {
        let mut samples = vec![0i16; 40];
        samples[2] = 900;
        samples[38] = 900;
        assert!(detect_peaks(&trace_of(samples), 150, &params(5)).is_empty());
    }

    #[test]
    fn test_below_min_height_skipped() {
        let mut samples = vec![0i16; 60];
        samples[30] = 149;
        assert!(detect_peaks(&trace_of(samples), 150, &params(5)).is_empty());
    }

    #[test]
    fn test_descending_height_order() {
        let mut samples = vec![0i16; 200];
        samples[40] = 300;
        samples[100] = 900;
        samples[160] = 600;
        let peaks = detect_peaks(&trace_of(samples), 150, &params(5));
        let heights: Vec<i16> = peaks.iter().map(|p| p.height).collect();
        assert_eq!(heights, vec![900, 600, 300]);
    }

    #[test]
    fn test_fraction_filter_flags_but_keeps() {
        let mut samples = vec![0i16; 300];
        samples[100] = 5000;
        samples[150] = 200; // within 100 scans of the tall peak
        samples[280] = 200; // outside the tall peak's neighborhood
        let p = PeakParams {
            min_distance: 5,
            fraction_of_max: Some(0.1),
            ..PeakParams::default()
        };
        let peaks = detect_peaks(&trace_of(samples), 150, &p);
        assert_eq!(peaks.len(), 3);
        let near = peaks.iter().find(|p| p.scan == 150).unwrap();
        let far = peaks.iter().find(|p| p.scan == 280).unwrap();
        assert!(!near.compliant);
        assert!(far.compliant);
    }

    proptest! {
        #[test]
        fn prop_peaks_meet_contract(samples in prop::collection::vec(-500i16..8000, 0..400)) {
            let min_height = 150;
            let p = params(5);
            let peaks = detect_peaks(&trace_of(samples.clone()), min_height, &p);
            let mut last_height = i16::MAX;
            let mut seen = std::collections::HashSet::new();
            for peak in &peaks {
                // unique apex positions
                prop_assert!(seen.insert(peak.scan));
                // above threshold, sorted descending
                prop_assert!(peak.height >= min_height);
                prop_assert!(peak.height <= last_height);
                last_height = peak.height;
                // never within min_distance of an edge
                prop_assert!(peak.scan >= p.min_distance);
                prop_assert!(peak.scan + p.min_distance < samples.len());
                prop_assert_eq!(samples[peak.scan], peak.height);
            }
        }
    }
}

//! Shared helpers for unit tests. Synthetic trace painting lives here and in
//! the container builder only; the decode path never generates data.

/// Paint a triangular peak apexing at `scan` into a channel trace.
pub(crate) fn paint_peak(samples: &mut [i16], scan: usize, height: i16) {
    let rise = height as i32 / 5;
    for step in 1..=4 {
        let offset = 5 - step;
        let level = (rise * step as i32) as i16;
        samples[scan - offset] = samples[scan - offset].max(level);
        samples[scan + offset] = samples[scan + offset].max(level);
    }
    samples[scan] = samples[scan].max(height);
}

/// Scan position whose size is `bp` under the default linear curve.
pub(crate) fn scan_at_bp(bp: f64) -> usize {
    ((bp - 100.0) / 0.1) as usize
}

//! Mapping sized peaks to allele designations, artifact classification, and
//! the diploid cap.
//!
//! Artifact detection is a fixed two-pass algorithm: pass one computes
//! stutter and adenylation flags against the immutable height-sorted
//! candidate list, pass two selects principal alleles from the non-artifact
//! peaks. No candidate is ever silently dropped; overflow beyond the
//! principal pair stays in the output for the Complex quality path.

use crate::{
    config::{Locus, Thresholds},
    error::Error,
    peak::Peak,
    sizing::Calibration,
    trace::Channel,
};

/// Repeat-count sanity bounds; designations outside are rejected unless a
/// ladder entry matches the size exactly.
const MIN_PLAUSIBLE_REPEATS: f64 = 6.0;
const MAX_PLAUSIBLE_REPEATS: f64 = 35.0;

/// Tolerance around one repeat unit for stutter pairing, in bp.
const STUTTER_TOLERANCE_BP: f64 = 1.0;
/// Tolerance around the +1 bp adenylation offset, in bp.
const ADENYLATION_TOLERANCE_BP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleQuality {
    Ok,
    /// Height at or above the overload threshold; pull-up suspect.
    Overloaded,
    /// Height at or above the detector's saturation ceiling.
    OffScale,
}

impl std::fmt::Display for AlleleQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlleleQuality::Ok => "ok",
            AlleleQuality::Overloaded => "overloaded",
            AlleleQuality::OffScale => "off-scale",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allele {
    /// Repeat-count label (`"14"`, `"9.3"`) or `"X"`/`"Y"` for the sex
    /// marker.
    pub designation: String,
    pub size_bp: f64,
    pub scan: usize,
    pub height: i16,
    pub area: f64,
    pub is_stutter: bool,
    pub is_adenylation: bool,
    pub quality: AlleleQuality,
    /// Peak passed the detector's fraction-of-max filter.
    pub compliant: bool,
    /// Member of the accepted diploid pair.
    pub principal: bool,
}

impl Allele {
    pub fn is_artifact(&self) -> bool {
        self.is_stutter || self.is_adenylation
    }
}

/// Call alleles for one locus from its channel's detected peaks.
///
/// Peaks must arrive sorted descending by height, as the detector returns
/// them. A zero-allele result is a valid outcome, interpreted downstream by
/// the quality assessor; only a missing sizing curve is an error here.
pub fn call_alleles(
    peaks: &[Peak],
    locus: &Locus,
    calibration: &Calibration,
    thresholds: &Thresholds,
) -> Result<Vec<Allele>, Error> {
    let channel = Channel(locus.channel);
    let curve = calibration
        .curve_for(channel)
        .ok_or_else(|| Error::Calibration {
            locus: locus.name.clone(),
            channel,
        })?;

    let mut candidates: Vec<Allele> = peaks
        .iter()
        .filter_map(|peak| {
            let size_bp = curve.bp_at(peak.scan);
            if size_bp < locus.min_bp || size_bp > locus.max_bp {
                return None;
            }
            let designation = designate(locus, size_bp, thresholds)?;
            Some(Allele {
                designation,
                size_bp,
                scan: peak.scan,
                height: peak.height,
                area: peak.area,
                is_stutter: false,
                is_adenylation: false,
                quality: quality_tag(peak.height, thresholds),
                compliant: peak.compliant,
                principal: false,
            })
        })
        .collect();

    // Pass one: artifact flags against the immutable sorted list.
    let snapshot: Vec<(f64, i16)> = candidates.iter().map(|a| (a.size_bp, a.height)).collect();
    for allele in candidates.iter_mut() {
        if let Some(unit) = locus.repeat_unit {
            allele.is_stutter = snapshot.iter().any(|&(size, height)| {
                height > allele.height
                    && (size - (allele.size_bp + unit)).abs() <= STUTTER_TOLERANCE_BP
                    && (allele.height as f64) < thresholds.stutter_threshold * height as f64
            });
        }
        allele.is_adenylation = snapshot.iter().any(|&(size, height)| {
            height > allele.height
                && (allele.size_bp - (size + 1.0)).abs() <= ADENYLATION_TOLERANCE_BP
                && (allele.height as f64) < thresholds.adenylation_threshold * height as f64
        });
    }

    // Pass two: principal selection in height order, capped at two.
    let mut accepted = 0;
    for allele in candidates.iter_mut() {
        if !allele.is_artifact() && accepted < 2 {
            allele.principal = true;
            accepted += 1;
        }
    }
    Ok(candidates)
}

fn quality_tag(height: i16, thresholds: &Thresholds) -> AlleleQuality {
    if height >= thresholds.max_rfu {
        AlleleQuality::OffScale
    } else if height >= thresholds.allele_overload_threshold {
        AlleleQuality::Overloaded
    } else {
        AlleleQuality::Ok
    }
}

/// Assign a designation, or `None` to reject the candidate outright.
fn designate(locus: &Locus, size_bp: f64, thresholds: &Thresholds) -> Option<String> {
    let Some(unit) = locus.repeat_unit else {
        // Sex marker: binary by bp cutoff.
        let label = if size_bp < thresholds.sex_cutoff_bp { "X" } else { "Y" };
        return Some(label.to_string());
    };

    let repeats = (size_bp - locus.min_bp) / unit;
    let nearest = repeats.round();
    if !(MIN_PLAUSIBLE_REPEATS..=MAX_PLAUSIBLE_REPEATS).contains(&nearest) {
        // Out-of-bound designations survive only on an exact ladder hit.
        return locus.ladder_match(size_bp).map(|entry| entry.designation.clone());
    }

    if (repeats - nearest).abs() >= 0.1 {
        let whole = repeats.floor();
        let partial_bases = ((repeats - whole) * unit).round();
        if partial_bases >= unit {
            Some(format!("{}", whole as i64 + 1))
        } else {
            Some(format!("{}.{}", whole as i64, partial_bases as i64))
        }
    } else {
        Some(format!("{}", nearest as i64))
    }
}

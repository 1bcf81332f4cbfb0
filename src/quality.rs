//! Locus and profile quality assessment.
//!
//! A small state machine over the non-artifact allele count decides each
//! locus's status; profile-level completeness and tiering aggregate those
//! statuses. Interpretation strings are fixed and used verbatim by the
//! report formatters.

use std::fmt;

use crate::{
    allele::Allele,
    config::Thresholds,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocusStatus {
    NoCall,
    PartialProfile,
    Homozygote,
    Complete,
    Complex,
}

impl fmt::Display for LocusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocusStatus::NoCall => "NoCall",
            LocusStatus::PartialProfile => "PartialProfile",
            LocusStatus::Homozygote => "Homozygote",
            LocusStatus::Complete => "Complete",
            LocusStatus::Complex => "Complex",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocusAssessment {
    pub status: LocusStatus,
    pub completeness: f64,
    /// Shorter/taller height ratio of a heterozygote pair.
    pub imbalance: Option<f64>,
    pub warnings: Vec<String>,
}

/// Assess one locus from its called alleles.
pub fn assess_locus(alleles: &[Allele], thresholds: &Thresholds) -> LocusAssessment {
    let principal: Vec<&Allele> = alleles.iter().filter(|a| !a.is_artifact()).collect();
    match principal.len() {
        0 => LocusAssessment {
            status: LocusStatus::NoCall,
            completeness: 0.0,
            imbalance: None,
            warnings: vec!["no alleles above threshold".to_string()],
        },
        1 => {
            if principal[0].height >= thresholds.min_bound_for_homozygote {
                LocusAssessment {
                    status: LocusStatus::Homozygote,
                    completeness: 1.0,
                    imbalance: None,
                    warnings: Vec::new(),
                }
            } else {
                LocusAssessment {
                    status: LocusStatus::PartialProfile,
                    completeness: 0.5,
                    imbalance: None,
                    warnings: vec!["possible allelic dropout".to_string()],
                }
            }
        }
        2 => {
            let tall = principal[0].height.max(principal[1].height) as f64;
            let short = principal[0].height.min(principal[1].height) as f64;
            let imbalance = short / tall;
            let mut warnings = Vec::new();
            if imbalance < thresholds.heterozygous_imbalance_limit {
                warnings.push(format!(
                    "heterozygote imbalance {imbalance:.2} below limit {:.2}",
                    thresholds.heterozygous_imbalance_limit
                ));
            }
            LocusAssessment {
                status: LocusStatus::Complete,
                completeness: 1.0,
                imbalance: Some(imbalance),
                warnings,
            }
        }
        _ => LocusAssessment {
            status: LocusStatus::Complex,
            completeness: 0.8,
            imbalance: None,
            warnings: vec!["possible mixture or triallelic pattern".to_string()],
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl QualityTier {
    pub fn interpretation(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "Complete high-quality profile suitable for comparison",
            QualityTier::Good => "Near-complete profile suitable for comparison",
            QualityTier::Acceptable => "Partial profile; interpret comparisons with caution",
            QualityTier::Poor => "Insufficient profile; reamplification recommended",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Acceptable => "Acceptable",
            QualityTier::Poor => "Poor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileAssessment {
    pub completeness: f64,
    pub quality: QualityTier,
    pub interpretation: &'static str,
}

/// Aggregate locus assessments into a profile-level verdict.
///
/// Completeness credits complete and homozygous loci fully and partial loci
/// by half, over the total assessed loci.
pub fn assess_overall<'a>(statuses: impl Iterator<Item = &'a LocusAssessment>) -> ProfileAssessment {
    let mut total = 0usize;
    let mut complete = 0usize;
    let mut homozygote = 0usize;
    let mut partial = 0usize;
    for assessment in statuses {
        total += 1;
        match assessment.status {
            LocusStatus::Complete => complete += 1,
            LocusStatus::Homozygote => homozygote += 1,
            LocusStatus::PartialProfile => partial += 1,
            LocusStatus::NoCall | LocusStatus::Complex => {}
        }
    }
    let completeness = if total == 0 {
        0.0
    } else {
        (complete as f64 + homozygote as f64 + 0.5 * partial as f64) / total as f64
    };
    let quality = if completeness >= 0.9 {
        QualityTier::Excellent
    } else if completeness >= 0.8 {
        QualityTier::Good
    } else if completeness >= 0.6 {
        QualityTier::Acceptable
    } else {
        QualityTier::Poor
    };
    ProfileAssessment {
        completeness,
        quality,
        interpretation: quality.interpretation(),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::allele::AlleleQuality;

    fn allele(designation: &str, height: i16, stutter: bool) -> Allele {
        Allele {
            designation: designation.to_string(),
            size_bp: 150.0,
            scan: 500,
            height,
            area: height as f64,
            is_stutter: stutter,
            is_adenylation: false,
            quality: AlleleQuality::Ok,
            compliant: true,
            principal: !stutter,
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_no_alleles_is_nocall() {
        let assessment = assess_locus(&[], &thresholds());
        assert_eq!(assessment.status, LocusStatus::NoCall);
        assert_eq!(assessment.completeness, 0.0);
        assert_eq!(assessment.warnings, vec!["no alleles above threshold"]);
    }

    #[test]
    fn test_artifacts_do_not_count() {
        let alleles = vec![allele("13", 160, true)];
        let assessment = assess_locus(&alleles, &thresholds());
        assert_eq!(assessment.status, LocusStatus::NoCall);
    }

    #[test]
    fn test_homozygote_boundary_inclusive() {
        // exactly at the bound: homozygote
        let at = assess_locus(&[allele("14", 200, false)], &thresholds());
        assert_eq!(at.status, LocusStatus::Homozygote);
        assert_eq!(at.completeness, 1.0);
        // one unit below: partial profile
        let below = assess_locus(&[allele("14", 199, false)], &thresholds());
        assert_eq!(below.status, LocusStatus::PartialProfile);
        assert_eq!(below.completeness, 0.5);
        assert_eq!(below.warnings, vec!["possible allelic dropout"]);
    }

    #[test]
    fn test_imbalanced_heterozygote_still_complete() {
        let alleles = vec![allele("14", 1000, false), allele("15", 400, false)];
        let assessment = assess_locus(&alleles, &thresholds());
        assert_eq!(assessment.status, LocusStatus::Complete);
        assert_eq!(assessment.completeness, 1.0);
        assert_eq!(assessment.imbalance, Some(0.4));
        assert_eq!(assessment.warnings.len(), 1);
    }

    #[test]
    fn test_balanced_heterozygote_no_warning() {
        let alleles = vec![allele("14", 1000, false), allele("15", 900, false)];
        let assessment = assess_locus(&alleles, &thresholds());
        assert_eq!(assessment.status, LocusStatus::Complete);
        assert!(assessment.warnings.is_empty());
        assert_eq!(assessment.imbalance, Some(0.9));
    }

    #[test]
    fn test_three_principal_is_complex() {
        let alleles = vec![
            allele("14", 1000, false),
            allele("15", 900, false),
            allele("17", 800, false),
        ];
        let assessment = assess_locus(&alleles, &thresholds());
        assert_eq!(assessment.status, LocusStatus::Complex);
        assert_eq!(assessment.completeness, 0.8);
        assert_eq!(assessment.warnings, vec!["possible mixture or triallelic pattern"]);
    }

    fn status_of(status: LocusStatus) -> LocusAssessment {
        LocusAssessment {
            status,
            completeness: 0.0,
            imbalance: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_overall_tiers() {
        // 8 complete of 8
        let all = vec![status_of(LocusStatus::Complete); 8];
        let assessment = assess_overall(all.iter());
        assert_eq!(assessment.completeness, 1.0);
        assert_eq!(assessment.quality, QualityTier::Excellent);
        assert_eq!(
            assessment.interpretation,
            "Complete high-quality profile suitable for comparison"
        );

        // 6 complete, 1 homozygote, 1 partial of 10 → 0.75
        let mut mixed = vec![status_of(LocusStatus::Complete); 6];
        mixed.push(status_of(LocusStatus::Homozygote));
        mixed.push(status_of(LocusStatus::PartialProfile));
        mixed.push(status_of(LocusStatus::NoCall));
        mixed.push(status_of(LocusStatus::NoCall));
        let assessment = assess_overall(mixed.iter());
        assert_eq!(assessment.completeness, 0.75);
        assert_eq!(assessment.quality, QualityTier::Acceptable);

        // nothing called
        let empty = vec![status_of(LocusStatus::NoCall); 4];
        let assessment = assess_overall(empty.iter());
        assert_eq!(assessment.quality, QualityTier::Poor);
    }
}

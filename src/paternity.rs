//! Locus-by-locus paternity comparison and the combined statistic.
//!
//! The combined index here is the simplified per-locus power law the
//! historical system shipped, reproduced exactly for compatibility; it is
//! not a population-frequency likelihood ratio.

use std::fmt;

use crate::{config::AnalysisConfig, error::Error, genotype::GenotypeProfile};

/// Fixed confidence reported for a two-or-more-locus exclusion.
pub const EXCLUSION_PROBABILITY: f64 = 99.9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Child,
    Father,
    Mother,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Child => "child",
            Role::Father => "father",
            Role::Mother => "mother",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Inclusion,
    Exclusion,
    Inconclusive,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Conclusion::Inclusion => "inclusion",
            Conclusion::Exclusion => "exclusion",
            Conclusion::Inconclusive => "inconclusive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocusComparison {
    pub locus: String,
    pub child: Vec<String>,
    pub father: Vec<String>,
    pub mother: Option<Vec<String>>,
    /// Child alleles not explainable by the mother.
    pub obligate: Vec<String>,
    pub matches: bool,
    pub exclusion: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub loci: Vec<LocusComparison>,
    pub informative_loci: usize,
    pub matching_loci: usize,
    pub exclusion_loci: Vec<String>,
    /// `base^matching_loci`; only on the zero-exclusion path.
    pub combined_index: Option<f64>,
    /// Probability of paternity on the zero-exclusion path, or the fixed
    /// exclusion confidence when excluded. Absent for the single-exclusion
    /// (possible mutation) outcome.
    pub probability: Option<f64>,
    pub conclusion: Conclusion,
}

/// Compare a child against an alleged father, with an optional mother.
///
/// Informative loci are every non-sex-marker kit locus called with at least
/// one principal allele in both child and father; anything else is skipped,
/// never scored. Profiles below the configured informative-locus minimum are
/// an `InsufficientData` error naming the role.
pub fn compare(
    child: &GenotypeProfile,
    father: &GenotypeProfile,
    mother: Option<&GenotypeProfile>,
    config: &AnalysisConfig,
) -> Result<ComparisonResult, Error> {
    let informative = |profile: &GenotypeProfile| {
        config
            .loci
            .iter()
            .filter(|l| !l.is_sex_marker() && profile.is_informative(&l.name))
            .count()
    };
    let minimum = config.paternity.min_informative_loci;
    for (role, profile) in [(Role::Child, child), (Role::Father, father)] {
        if informative(profile) < minimum {
            return Err(Error::InsufficientData { role });
        }
    }

    let mut loci = Vec::new();
    let mut matching = 0usize;
    let mut exclusions = Vec::new();
    for locus in config.loci.iter().filter(|l| !l.is_sex_marker()) {
        let child_alleles = owned(child.designations(&locus.name));
        let father_alleles = owned(father.designations(&locus.name));
        // empty on either side: not informative, neither match nor exclusion
        if child_alleles.is_empty() || father_alleles.is_empty() {
            continue;
        }
        let mother_alleles = mother.map(|m| owned(m.designations(&locus.name)));
        let obligate: Vec<String> = match &mother_alleles {
            Some(maternal) => child_alleles
                .iter()
                .filter(|a| !maternal.contains(a))
                .cloned()
                .collect(),
            None => child_alleles.clone(),
        };
        let matches =
            obligate.is_empty() || obligate.iter().any(|a| father_alleles.contains(a));
        if matches {
            matching += 1;
        } else {
            exclusions.push(locus.name.clone());
        }
        loci.push(LocusComparison {
            locus: locus.name.clone(),
            child: child_alleles,
            father: father_alleles,
            mother: mother_alleles,
            obligate,
            matches,
            exclusion: !matches,
        });
    }

    let informative_loci = loci.len();
    let (combined_index, probability, conclusion) = match exclusions.len() {
        0 => {
            let index = config.paternity.index_base.powi(matching as i32);
            let probability = index / (index + 1.0) * 100.0;
            let conclusion = if probability > 99.0 {
                Conclusion::Inclusion
            } else {
                Conclusion::Inconclusive
            };
            (Some(index), Some(probability), conclusion)
        }
        // a single mismatch may be mutation, not exclusion
        1 => (None, None, Conclusion::Inconclusive),
        _ => (None, Some(EXCLUSION_PROBABILITY), Conclusion::Exclusion),
    };

    Ok(ComparisonResult {
        loci,
        informative_loci,
        matching_loci: matching,
        exclusion_loci: exclusions,
        combined_index,
        probability,
        conclusion,
    })
}

fn owned(designations: Vec<&str>) -> Vec<String> {
    designations.into_iter().map(str::to_string).collect()
}

//! The durable analysis output: per-sample, per-locus allele calls.

use std::collections::BTreeMap;

use crate::{
    allele::Allele,
    quality::{LocusAssessment, LocusStatus, ProfileAssessment},
};

/// All allele records for one locus plus its quality assessment. Artifacts
/// and overflow candidates stay alongside the principal pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusCall {
    pub locus: String,
    pub alleles: Vec<Allele>,
    pub assessment: LocusAssessment,
}

impl LocusCall {
    pub fn principal(&self) -> impl Iterator<Item = &Allele> {
        self.alleles.iter().filter(|a| a.principal)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Allele> {
        self.alleles.iter().filter(|a| a.is_artifact())
    }

    pub fn principal_designations(&self) -> Vec<&str> {
        self.principal().map(|a| a.designation.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeProfile {
    pub sample: String,
    pub loci: BTreeMap<String, LocusCall>,
    pub assessment: ProfileAssessment,
}

impl GenotypeProfile {
    /// Principal designations at a locus; empty when the locus was not
    /// called or produced nothing.
    pub fn designations(&self, locus: &str) -> Vec<&str> {
        self.loci
            .get(locus)
            .map(|call| call.principal_designations())
            .unwrap_or_default()
    }

    /// A locus counts as informative when it was called with at least one
    /// principal allele.
    pub fn is_informative(&self, locus: &str) -> bool {
        self.loci
            .get(locus)
            .map(|call| {
                call.assessment.status != LocusStatus::NoCall && call.principal().next().is_some()
            })
            .unwrap_or(false)
    }
}

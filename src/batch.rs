//! Batch analysis across many instrument files.
//!
//! Files have no cross-file data dependency, so the batch fans out one
//! worker per file; each worker owns its buffer and trace arrays. A failed
//! file is recorded and the batch carries on.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{error::Error, genotype::GenotypeProfile, pipeline::Analyzer};

#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<GenotypeProfile, Error>,
}

#[derive(Debug)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &GenotypeProfile> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

impl Analyzer {
    /// Analyze every path, in parallel, preserving input order in the
    /// summary.
    pub fn analyze_batch<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> BatchSummary {
        let outcomes = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let result = self.analyze_path(&path);
                if let Err(err) = &result {
                    log::warn!("{}: analysis failed: {err}", path.display());
                }
                FileOutcome { path, result }
            })
            .collect();
        BatchSummary { outcomes }
    }
}

//! Kit tables, threshold sets, and comparison settings.
//!
//! Configuration is loaded once, validated, and then passed by shared
//! reference into every pipeline stage; nothing here is mutated after load.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{error::Error, peak::PeakParams};

/// A ladder entry: a designation with its reference fragment size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LadderAllele {
    pub designation: String,
    pub size_bp: f64,
}

/// One STR marker definition from the kit table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Locus {
    pub name: String,
    /// Data channel number, 1 through 4.
    pub channel: u8,
    pub dye: String,
    pub min_bp: f64,
    pub max_bp: f64,
    /// Base pairs per repeat. Absent for the sex marker, which is called by
    /// a fixed bp cutoff instead of repeat counting.
    pub repeat_unit: Option<f64>,
    #[serde(default)]
    pub ladder: Vec<LadderAllele>,
}

impl Locus {
    pub fn is_sex_marker(&self) -> bool {
        self.repeat_unit.is_none()
    }

    /// An exact ladder hit rescues a designation the repeat-count sanity
    /// bound would otherwise reject.
    pub fn ladder_match(&self, size_bp: f64) -> Option<&LadderAllele> {
        self.ladder
            .iter()
            .find(|entry| (entry.size_bp - size_bp).abs() <= 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum peak height considered signal at all.
    pub min_rfu: i16,
    /// Heights at or above this are flagged off-scale (detector saturation).
    pub max_rfu: i16,
    /// Height ratio below which a one-repeat-shorter peak is stutter.
    pub stutter_threshold: f64,
    /// Height ratio below which a +1 bp peak is incomplete adenylation.
    pub adenylation_threshold: f64,
    /// Heterozygote min/max height ratio below which balance is warned.
    pub heterozygous_imbalance_limit: f64,
    /// A lone peak must reach this height to be called homozygous.
    pub min_bound_for_homozygote: i16,
    /// Heights at or above this are flagged overloaded (pull-up risk).
    pub allele_overload_threshold: i16,
    /// Sex marker: sizes below this bp are X, at or above are Y.
    pub sex_cutoff_bp: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_rfu: 150,
            max_rfu: 8000,
            stutter_threshold: 0.15,
            adenylation_threshold: 0.3,
            heterozygous_imbalance_limit: 0.6,
            min_bound_for_homozygote: 200,
            allele_overload_threshold: 6000,
            sex_cutoff_bp: 109.0,
        }
    }
}

/// Size-calibration strategy selection.
///
/// With no ladder channel the pipeline sizes every trace through the
/// historical linear mapping. Naming a ladder channel fits a piecewise
/// curve from that channel's peaks instead, falling back to linear when the
/// ladder cannot be fitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingSettings {
    /// Data channel carrying the internal lane standard, when recorded.
    pub ladder_channel: Option<u8>,
    /// Known ladder fragment sizes in bp, ascending.
    pub ladder_sizes: Vec<f64>,
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            ladder_channel: None,
            ladder_sizes: liz500_sizes(),
        }
    }
}

/// GeneScan LIZ 500 fragment sizes.
fn liz500_sizes() -> Vec<f64> {
    vec![
        35.0, 50.0, 75.0, 100.0, 139.0, 150.0, 160.0, 200.0, 250.0, 300.0, 340.0, 350.0, 400.0,
        450.0, 490.0, 500.0,
    ]
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaternitySettings {
    /// Per-locus index base for the combined statistic.
    pub index_base: f64,
    /// Informative loci a profile must carry to enter a comparison.
    pub min_informative_loci: usize,
}

impl Default for PaternitySettings {
    fn default() -> Self {
        Self {
            index_base: 2.0,
            min_informative_loci: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub loci: Vec<Locus>,
    pub thresholds: Thresholds,
    pub peaks: PeakParams,
    pub sizing: SizingSettings,
    pub paternity: PaternitySettings,
    /// Channel number to dye name.
    pub dyes: BTreeMap<u8, String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            loci: default_kit(),
            thresholds: Thresholds::default(),
            peaks: PeakParams::default(),
            sizing: SizingSettings::default(),
            paternity: PaternitySettings::default(),
            dyes: default_dyes(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: AnalysisConfig =
            serde_json::from_str(text).map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let fail = |msg: String| Err(Error::Configuration(msg));
        if self.loci.is_empty() {
            return fail("kit table has no loci".into());
        }
        let mut seen = std::collections::HashSet::new();
        for locus in &self.loci {
            if !seen.insert(locus.name.as_str()) {
                return fail(format!("duplicate locus {}", locus.name));
            }
            if !(1..=4).contains(&locus.channel) {
                return fail(format!("locus {}: channel {} outside 1-4", locus.name, locus.channel));
            }
            if !self.dyes.contains_key(&locus.channel) {
                return fail(format!("locus {}: channel {} has no dye", locus.name, locus.channel));
            }
            if locus.min_bp >= locus.max_bp {
                return fail(format!(
                    "locus {}: min_bp {} not below max_bp {}",
                    locus.name, locus.min_bp, locus.max_bp
                ));
            }
            if let Some(unit) = locus.repeat_unit {
                if unit <= 0.0 {
                    return fail(format!("locus {}: repeat unit {unit} not positive", locus.name));
                }
            }
        }
        let t = &self.thresholds;
        for (name, ratio) in [
            ("stutter_threshold", t.stutter_threshold),
            ("adenylation_threshold", t.adenylation_threshold),
            ("heterozygous_imbalance_limit", t.heterozygous_imbalance_limit),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return fail(format!("{name} {ratio} outside 0-1"));
            }
        }
        if t.min_rfu <= 0 {
            return fail(format!("min_rfu {} not positive", t.min_rfu));
        }
        if self.paternity.index_base <= 1.0 {
            return fail(format!("index_base {} not above 1", self.paternity.index_base));
        }
        if self.sizing.ladder_channel.is_some() && self.sizing.ladder_sizes.len() < 2 {
            return fail("ladder sizing needs at least two fragment sizes".into());
        }
        Ok(())
    }

    pub fn locus(&self, name: &str) -> Option<&Locus> {
        self.loci.iter().find(|l| l.name == name)
    }

    pub fn sex_marker(&self) -> Option<&Locus> {
        self.loci.iter().find(|l| l.is_sex_marker())
    }
}

fn default_dyes() -> BTreeMap<u8, String> {
    [(1, "6-FAM"), (2, "VIC"), (3, "NED"), (4, "PET")]
        .into_iter()
        .map(|(ch, dye)| (ch, dye.to_string()))
        .collect()
}

fn str_locus(name: &str, channel: u8, dye: &str, min_bp: f64, max_bp: f64) -> Locus {
    Locus {
        name: name.to_string(),
        channel,
        dye: dye.to_string(),
        min_bp,
        max_bp,
        repeat_unit: Some(4.0),
        ladder: Vec::new(),
    }
}

/// Built-in four-dye kit: two tetranucleotide markers per dye plus the sex
/// marker, with windows chosen so the repeat-count sanity bound (6-35) covers
/// each marker's plausible allele range.
fn default_kit() -> Vec<Locus> {
    let mut kit = vec![
        str_locus("D8S1179", 1, "6-FAM", 100.0, 240.0),
        str_locus("CSF1PO", 1, "6-FAM", 250.0, 390.0),
        str_locus("D3S1358", 2, "VIC", 100.0, 240.0),
        str_locus("TH01", 2, "VIC", 250.0, 390.0),
        str_locus("vWA", 3, "NED", 100.0, 240.0),
        str_locus("D18S51", 3, "NED", 250.0, 390.0),
        Locus {
            name: "AMEL".to_string(),
            channel: 4,
            dye: "PET".to_string(),
            min_bp: 100.0,
            max_bp: 125.0,
            repeat_unit: None,
            ladder: Vec::new(),
        },
        str_locus("FGA", 4, "PET", 130.0, 280.0),
    ];
    // TH01 carries the classic 9.3 micro-variant in its ladder
    if let Some(th01) = kit.iter_mut().find(|l| l.name == "TH01") {
        th01.ladder = [
            ("6", 274.0),
            ("7", 278.0),
            ("8", 282.0),
            ("9", 286.0),
            ("9.3", 289.0),
            ("10", 290.0),
        ]
        .into_iter()
        .map(|(designation, size_bp)| LadderAllele {
            designation: designation.to_string(),
            size_bp,
        })
        .collect();
    }
    kit
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.loci.len(), 8);
        assert_eq!(config.sex_marker().unwrap().name, "AMEL");
    }

    #[test]
    fn test_json_overrides_thresholds() {
        let config = AnalysisConfig::from_json(r#"{"thresholds": {"min_rfu": 75}}"#).unwrap();
        assert_eq!(config.thresholds.min_rfu, 75);
        // untouched fields keep their defaults
        assert_eq!(config.thresholds.stutter_threshold, 0.15);
        assert_eq!(config.loci.len(), 8);
    }

    #[test]
    fn test_rejects_inverted_bp_window() {
        let text = r#"{"loci": [{"name": "BAD", "channel": 1, "dye": "6-FAM",
                       "min_bp": 200.0, "max_bp": 100.0, "repeat_unit": 4.0}]}"#;
        let err = AnalysisConfig::from_json(text).unwrap_err();
        assert!(err.to_string().contains("BAD"));
    }

    #[test]
    fn test_rejects_duplicate_locus() {
        let mut config = AnalysisConfig::default();
        config.loci.push(config.loci[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_channel() {
        let mut config = AnalysisConfig::default();
        config.loci[0].channel = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ladder_sizing_needs_fragments() {
        let mut config = AnalysisConfig::default();
        config.sizing.ladder_channel = Some(5);
        config.validate().unwrap();
        config.sizing.ladder_sizes = vec![100.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ladder_match_tolerance() {
        let config = AnalysisConfig::default();
        let th01 = config.locus("TH01").unwrap();
        assert_eq!(th01.ladder_match(289.4).unwrap().designation, "9.3");
        assert!(th01.ladder_match(292.0).is_none());
    }
}

//! End-to-end analysis of one instrument file.

use std::{collections::BTreeMap, fs, path::Path};

use abif_format::Container;

use crate::{
    allele::call_alleles,
    config::AnalysisConfig,
    error::Error,
    genotype::{GenotypeProfile, LocusCall},
    peak::{detect_peaks, Peak},
    quality::{assess_locus, assess_overall},
    sizing::{Calibration, LadderCurve, SizeCurve},
    trace::{self, Channel, Trace, DATA_TAG},
};

/// Runs the pipeline: container → traces → peaks → allele calls → assessed
/// profile. Holds only the validated, immutable configuration; every
/// analysis owns its own buffers, so one analyzer can serve parallel
/// workers.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze_path<P: AsRef<Path>>(&self, path: P) -> Result<GenotypeProfile, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let fallback_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        self.analyze_bytes(&fallback_id, bytes)
    }

    /// Analyze raw container bytes. `fallback_id` names the sample when the
    /// container carries no sample-name entry.
    pub fn analyze_bytes(&self, fallback_id: &str, bytes: Vec<u8>) -> Result<GenotypeProfile, Error> {
        let container = Container::parse(bytes)?;
        let sample = trace::sample_name(&container).unwrap_or_else(|| fallback_id.to_string());
        let traces = trace::extract_traces(&container, &self.config.dyes)?;
        let calibration = self.calibrate(&container, traces.keys().copied());

        let peaks_by_channel: BTreeMap<Channel, Vec<Peak>> = traces
            .iter()
            .map(|(&channel, tr)| {
                (
                    channel,
                    detect_peaks(tr, self.config.thresholds.min_rfu, &self.config.peaks),
                )
            })
            .collect();

        let mut loci = BTreeMap::new();
        for locus in &self.config.loci {
            let channel = Channel(locus.channel);
            // a missing channel leaves the locus uncalled, not failed
            let alleles = match peaks_by_channel.get(&channel) {
                Some(peaks) => call_alleles(peaks, locus, &calibration, &self.config.thresholds)?,
                None => Vec::new(),
            };
            let assessment = assess_locus(&alleles, &self.config.thresholds);
            loci.insert(
                locus.name.clone(),
                LocusCall {
                    locus: locus.name.clone(),
                    alleles,
                    assessment,
                },
            );
        }
        let assessment = assess_overall(loci.values().map(|call| &call.assessment));
        log::debug!(
            "sample {sample}: completeness {:.2}, quality {}",
            assessment.completeness,
            assessment.quality
        );
        Ok(GenotypeProfile {
            sample,
            loci,
            assessment,
        })
    }

    /// Pick the sizing curves for this run. A configured ladder channel is
    /// fitted from its own detected peaks and applied to every dye channel
    /// (the lane standard runs in the same lane); otherwise, or when the
    /// fit fails, every channel gets the linear default.
    fn calibrate(
        &self,
        container: &Container,
        channels: impl Iterator<Item = Channel>,
    ) -> Calibration {
        let Some(ladder_channel) = self.config.sizing.ladder_channel else {
            return Calibration::linear_default(channels);
        };
        match self.fit_ladder(container, ladder_channel) {
            Some(curve) => channels.fold(Calibration::default(), |calibration, ch| {
                calibration.with_curve(ch, curve.clone())
            }),
            None => {
                log::warn!(
                    "ladder channel {ladder_channel}: no usable ladder, sizing stays linear"
                );
                Calibration::linear_default(channels)
            }
        }
    }

    fn fit_ladder(&self, container: &Container, ladder_channel: u8) -> Option<SizeCurve> {
        let entry = container.entry(DATA_TAG, ladder_channel as u32)?;
        let samples = container.read_i16s(entry).ok()?;
        let trace = Trace {
            channel: Channel(ladder_channel),
            dye: "LIZ".to_string(),
            samples,
        };
        let peaks = detect_peaks(&trace, self.config.thresholds.min_rfu, &self.config.peaks);
        LadderCurve::fit(&peaks, &self.config.sizing.ladder_sizes).map(SizeCurve::Ladder)
    }
}

#[cfg(test)]
mod test {
    use abif_format::ContainerBuilder;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        quality::{LocusStatus, QualityTier},
        testutil::{paint_peak, scan_at_bp},
    };

    #[test]
    fn test_full_pipeline_on_synthetic_container() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = AnalysisConfig::default();
        let mut ch1 = vec![0i16; 4000];
        // D8S1179 heterozygote 14/15 plus a stutter at 13
        paint_peak(&mut ch1, scan_at_bp(156.0), 1200);
        paint_peak(&mut ch1, scan_at_bp(160.0), 1100);
        paint_peak(&mut ch1, scan_at_bp(152.0), 160);
        // CSF1PO homozygote 10
        paint_peak(&mut ch1, scan_at_bp(290.0), 900);
        let mut ch4 = vec![0i16; 4000];
        // AMEL X/Y
        paint_peak(&mut ch4, scan_at_bp(106.0), 800);
        paint_peak(&mut ch4, scan_at_bp(112.0), 760);

        let mut builder = ContainerBuilder::new();
        builder.add_pascal_string(crate::trace::SAMPLE_NAME_TAG, 1, "CHILD_001");
        builder.add_i16s(crate::trace::DATA_TAG, 1, &ch1);
        builder.add_i16s(crate::trace::DATA_TAG, 4, &ch4);

        let analyzer = Analyzer::new(config).unwrap();
        let profile = analyzer.analyze_bytes("fallback", builder.finish()).unwrap();

        assert_eq!(profile.sample, "CHILD_001");
        assert_eq!(profile.designations("D8S1179"), vec!["14", "15"]);
        let d8 = &profile.loci["D8S1179"];
        assert_eq!(d8.assessment.status, LocusStatus::Complete);
        assert_eq!(d8.artifacts().count(), 1);
        assert_eq!(profile.designations("CSF1PO"), vec!["10"]);
        assert_eq!(profile.loci["CSF1PO"].assessment.status, LocusStatus::Homozygote);
        let mut amel = profile.designations("AMEL");
        amel.sort_unstable();
        assert_eq!(amel, vec!["X", "Y"]);
        // channels 2 and 3 absent: their loci are NoCall, not errors
        assert_eq!(profile.loci["TH01"].assessment.status, LocusStatus::NoCall);
    }

    #[test]
    fn test_min_rfu_governs_detection() {
        let mut config = AnalysisConfig::default();
        config.thresholds.min_rfu = 5000;
        let mut ch1 = vec![0i16; 4000];
        paint_peak(&mut ch1, scan_at_bp(156.0), 1200);
        let mut builder = ContainerBuilder::new();
        builder.add_i16s(crate::trace::DATA_TAG, 1, &ch1);

        let analyzer = Analyzer::new(config).unwrap();
        let profile = analyzer.analyze_bytes("S1", builder.finish()).unwrap();
        // 1200 RFU is below the raised floor, so nothing is called
        assert!(profile.designations("D8S1179").is_empty());
        assert_eq!(profile.loci["D8S1179"].assessment.status, LocusStatus::NoCall);
    }

    #[test]
    fn test_ladder_channel_drives_sizing() {
        let mut config = AnalysisConfig::default();
        config.sizing.ladder_channel = Some(5);
        config.sizing.ladder_sizes = vec![100.0, 200.0];

        // ladder fragments at scans 500 and 1500 give bp = 50 + 0.1*scan
        let mut ladder = vec![0i16; 4000];
        paint_peak(&mut ladder, 500, 2000);
        paint_peak(&mut ladder, 1500, 1900);
        // sample peak at scan 1100: 160 bp under the ladder curve, allele 15
        let mut ch1 = vec![0i16; 4000];
        paint_peak(&mut ch1, 1100, 1200);

        let mut builder = ContainerBuilder::new();
        builder.add_i16s(crate::trace::DATA_TAG, 1, &ch1);
        builder.add_i16s(crate::trace::DATA_TAG, 5, &ladder);

        let analyzer = Analyzer::new(config).unwrap();
        let profile = analyzer.analyze_bytes("S1", builder.finish()).unwrap();
        assert_eq!(profile.designations("D8S1179"), vec!["15"]);
    }

    #[test]
    fn test_missing_ladder_falls_back_to_linear() {
        let mut config = AnalysisConfig::default();
        config.sizing.ladder_channel = Some(5);
        config.sizing.ladder_sizes = vec![100.0, 200.0];

        // no DATA 5 entry: sizing stays linear, scan 560 is 156 bp
        let mut ch1 = vec![0i16; 4000];
        paint_peak(&mut ch1, scan_at_bp(156.0), 1200);
        let mut builder = ContainerBuilder::new();
        builder.add_i16s(crate::trace::DATA_TAG, 1, &ch1);

        let analyzer = Analyzer::new(config).unwrap();
        let profile = analyzer.analyze_bytes("S1", builder.finish()).unwrap();
        assert_eq!(profile.designations("D8S1179"), vec!["14"]);
    }

    #[test]
    fn test_bad_file_fails_fast() {
        let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
        let err = analyzer.analyze_bytes("x", b"not a container".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_fallback_sample_id_used() {
        let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
        let bytes = ContainerBuilder::new().finish();
        let profile = analyzer.analyze_bytes("RUN_07_A3", bytes).unwrap();
        assert_eq!(profile.sample, "RUN_07_A3");
        assert_eq!(profile.assessment.quality, QualityTier::Poor);
    }
}

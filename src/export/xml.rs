//! XML report rendering via serde.

use serde::Serialize;

use crate::{error::Error, genotype::GenotypeProfile, paternity::ComparisonResult};

#[derive(Serialize)]
#[serde(rename = "GenotypeReport")]
struct ProfileReport<'a> {
    #[serde(rename = "Sample")]
    samples: Vec<SampleXml<'a>>,
}

#[derive(Serialize)]
struct SampleXml<'a> {
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "@completeness")]
    completeness: String,
    #[serde(rename = "@quality")]
    quality: String,
    #[serde(rename = "@interpretation")]
    interpretation: &'a str,
    #[serde(rename = "Locus")]
    loci: Vec<LocusXml<'a>>,
}

#[derive(Serialize)]
struct LocusXml<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@status")]
    status: String,
    #[serde(rename = "Allele")]
    alleles: Vec<AlleleXml<'a>>,
}

#[derive(Serialize)]
struct AlleleXml<'a> {
    #[serde(rename = "@value")]
    value: &'a str,
    #[serde(rename = "@size")]
    size: String,
    #[serde(rename = "@height")]
    height: i16,
    #[serde(rename = "@area")]
    area: String,
    #[serde(rename = "@quality")]
    quality: String,
    #[serde(rename = "@stutter")]
    stutter: bool,
    #[serde(rename = "@adenylation")]
    adenylation: bool,
    #[serde(rename = "@principal")]
    principal: bool,
}

/// Render one or more profiles as a single XML document.
pub fn profiles_to_xml(profiles: &[&GenotypeProfile]) -> Result<String, Error> {
    let samples = profiles
        .iter()
        .map(|profile| SampleXml {
            id: &profile.sample,
            completeness: format!("{:.3}", profile.assessment.completeness),
            quality: profile.assessment.quality.to_string(),
            interpretation: profile.assessment.interpretation,
            loci: profile
                .loci
                .values()
                .map(|call| LocusXml {
                    name: &call.locus,
                    status: call.assessment.status.to_string(),
                    alleles: call
                        .alleles
                        .iter()
                        .map(|a| AlleleXml {
                            value: &a.designation,
                            size: format!("{:.1}", a.size_bp),
                            height: a.height,
                            area: format!("{:.1}", a.area),
                            quality: a.quality.to_string(),
                            stutter: a.is_stutter,
                            adenylation: a.is_adenylation,
                            principal: a.principal,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Ok(quick_xml::se::to_string(&ProfileReport { samples })?)
}

#[derive(Serialize)]
#[serde(rename = "PaternityReport")]
struct ComparisonReport<'a> {
    #[serde(rename = "@conclusion")]
    conclusion: String,
    #[serde(rename = "@probability", skip_serializing_if = "Option::is_none")]
    probability: Option<String>,
    #[serde(rename = "@combined_index", skip_serializing_if = "Option::is_none")]
    combined_index: Option<String>,
    #[serde(rename = "@matching_loci")]
    matching_loci: usize,
    #[serde(rename = "@informative_loci")]
    informative_loci: usize,
    #[serde(rename = "Locus")]
    loci: Vec<ComparisonLocusXml<'a>>,
}

#[derive(Serialize)]
struct ComparisonLocusXml<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@child")]
    child: String,
    #[serde(rename = "@father")]
    father: String,
    #[serde(rename = "@mother", skip_serializing_if = "Option::is_none")]
    mother: Option<String>,
    #[serde(rename = "@obligate")]
    obligate: String,
    #[serde(rename = "@match")]
    matched: bool,
    #[serde(rename = "@exclusion")]
    exclusion: bool,
}

fn joined(designations: &[String]) -> String {
    designations.join("/")
}

/// Render a comparison result as an XML document.
pub fn comparison_to_xml(result: &ComparisonResult) -> Result<String, Error> {
    let report = ComparisonReport {
        conclusion: result.conclusion.to_string(),
        probability: result.probability.map(|p| format!("{p:.4}")),
        combined_index: result.combined_index.map(|ci| format!("{ci:.4}")),
        matching_loci: result.matching_loci,
        informative_loci: result.informative_loci,
        loci: result
            .loci
            .iter()
            .map(|locus| ComparisonLocusXml {
                name: &locus.locus,
                child: joined(&locus.child),
                father: joined(&locus.father),
                mother: locus.mother.as_deref().map(joined),
                obligate: joined(&locus.obligate),
                matched: locus.matches,
                exclusion: locus.exclusion,
            })
            .collect(),
    };
    Ok(quick_xml::se::to_string(&report)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::AnalysisConfig,
        paternity::compare,
        pipeline::Analyzer,
        trace::{DATA_TAG, SAMPLE_NAME_TAG},
    };
    use abif_format::ContainerBuilder;

    fn sample_profile(id: &str) -> GenotypeProfile {
        use crate::testutil::{paint_peak, scan_at_bp};
        let mut ch1 = vec![0i16; 4000];
        paint_peak(&mut ch1, scan_at_bp(156.0), 1200);
        paint_peak(&mut ch1, scan_at_bp(160.0), 1100);
        let mut builder = ContainerBuilder::new();
        builder.add_pascal_string(SAMPLE_NAME_TAG, 1, id);
        builder.add_i16s(DATA_TAG, 1, &ch1);
        let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
        analyzer.analyze_bytes(id, builder.finish()).unwrap()
    }

    #[test]
    fn test_profile_xml_carries_attributes() {
        let profile = sample_profile("CHILD_001");
        let xml = profiles_to_xml(&[&profile]).unwrap();
        assert!(xml.starts_with("<GenotypeReport>"));
        assert!(xml.contains(r#"id="CHILD_001""#));
        assert!(xml.contains(r#"name="D8S1179""#));
        assert!(xml.contains(r#"value="14""#));
        assert!(xml.contains(r#"value="15""#));
        assert!(xml.contains(r#"status="Complete""#));
    }

    #[test]
    fn test_comparison_xml_summary_block() {
        let child = sample_profile("C");
        let father = sample_profile("F");
        let result = compare(&child, &father, None, &AnalysisConfig::default()).unwrap();
        let xml = comparison_to_xml(&result).unwrap();
        assert!(xml.contains(r#"conclusion="inconclusive""#));
        assert!(xml.contains("combined_index"));
        assert!(xml.contains(r#"match="true""#));
    }
}

//! Flat CSV rendering.
//!
//! Allele lists inside a field are joined with `/` so rows stay
//! comma-splittable.

use std::io::{self, Write};

use crate::{allele::Allele, genotype::GenotypeProfile, paternity::ComparisonResult};

pub const PROFILE_HEADER: &str =
    "sample,locus,allele1,allele2,height1,height2,area1,area2,quality,artifacts,compliant";

pub fn write_profile_csv<W: Write>(writer: &mut W, profile: &GenotypeProfile) -> io::Result<()> {
    writeln!(writer, "{PROFILE_HEADER}")?;
    for call in profile.loci.values() {
        let principal: Vec<&Allele> = call.principal().collect();
        let first = principal.first();
        let second = principal.get(1);
        let artifacts = call
            .artifacts()
            .map(|a| a.designation.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let compliant = principal.iter().all(|a| a.compliant);
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            profile.sample,
            call.locus,
            first.map(|a| a.designation.as_str()).unwrap_or(""),
            second.map(|a| a.designation.as_str()).unwrap_or(""),
            first.map(|a| a.height.to_string()).unwrap_or_default(),
            second.map(|a| a.height.to_string()).unwrap_or_default(),
            first.map(|a| format!("{:.1}", a.area)).unwrap_or_default(),
            second.map(|a| format!("{:.1}", a.area)).unwrap_or_default(),
            call.assessment.status,
            artifacts,
            compliant,
        )?;
    }
    Ok(())
}

pub fn profile_csv(profile: &GenotypeProfile) -> String {
    let mut buf = Vec::new();
    // writing to a Vec cannot fail
    write_profile_csv(&mut buf, profile).expect("infallible write");
    String::from_utf8(buf).expect("csv output is utf-8")
}

pub const COMPARISON_HEADER: &str = "locus,child,father,mother,obligate,match,exclusion";

pub fn write_comparison_csv<W: Write>(writer: &mut W, result: &ComparisonResult) -> io::Result<()> {
    writeln!(writer, "{COMPARISON_HEADER}")?;
    for locus in &result.loci {
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            locus.locus,
            locus.child.join("/"),
            locus.father.join("/"),
            locus.mother.as_ref().map(|m| m.join("/")).unwrap_or_default(),
            locus.obligate.join("/"),
            locus.matches,
            locus.exclusion,
        )?;
    }
    writeln!(writer, "summary,conclusion,{}", result.conclusion)?;
    writeln!(
        writer,
        "summary,probability,{}",
        result.probability.map(|p| format!("{p:.4}")).unwrap_or_default()
    )?;
    writeln!(
        writer,
        "summary,combined_index,{}",
        result.combined_index.map(|ci| format!("{ci:.4}")).unwrap_or_default()
    )?;
    writeln!(
        writer,
        "summary,matching_loci,{}/{}",
        result.matching_loci, result.informative_loci
    )?;
    Ok(())
}

pub fn comparison_csv(result: &ComparisonResult) -> String {
    let mut buf = Vec::new();
    write_comparison_csv(&mut buf, result).expect("infallible write");
    String::from_utf8(buf).expect("csv output is utf-8")
}

#[cfg(test)]
mod test {
    use abif_format::ContainerBuilder;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::AnalysisConfig,
        paternity::compare,
        pipeline::Analyzer,
        testutil::{paint_peak, scan_at_bp},
        trace::{DATA_TAG, SAMPLE_NAME_TAG},
    };

    fn heterozygote_profile(id: &str, bp: [f64; 2]) -> GenotypeProfile {
        let mut ch1 = vec![0i16; 4000];
        paint_peak(&mut ch1, scan_at_bp(bp[0]), 1200);
        paint_peak(&mut ch1, scan_at_bp(bp[1]), 1100);
        let mut builder = ContainerBuilder::new();
        builder.add_pascal_string(SAMPLE_NAME_TAG, 1, id);
        builder.add_i16s(DATA_TAG, 1, &ch1);
        let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
        analyzer.analyze_bytes(id, builder.finish()).unwrap()
    }

    #[test]
    fn test_profile_rows() {
        // D8S1179 alleles 14 and 15
        let profile = heterozygote_profile("CHILD_001", [156.0, 160.0]);
        let csv = profile_csv(&profile);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), PROFILE_HEADER);
        let d8 = csv
            .lines()
            .find(|line| line.starts_with("CHILD_001,D8S1179"))
            .unwrap();
        let fields: Vec<&str> = d8.split(',').collect();
        assert_eq!(fields[2], "14");
        assert_eq!(fields[3], "15");
        assert_eq!(fields[4], "1200");
        assert_eq!(fields[5], "1100");
        assert_eq!(fields[8], "Complete");
        assert_eq!(fields[10], "true");
        // uncalled loci still get a row
        assert!(csv.lines().any(|line| line.starts_with("CHILD_001,TH01,,,")));
    }

    #[test]
    fn test_comparison_rows_and_summary() {
        let child = heterozygote_profile("C", [156.0, 160.0]); // 14/15
        let father = heterozygote_profile("F", [156.0, 168.0]); // 14/17
        let result = compare(&child, &father, None, &AnalysisConfig::default()).unwrap();
        let csv = comparison_csv(&result);
        assert!(csv.starts_with(COMPARISON_HEADER));
        assert!(csv.contains("D8S1179,14/15,14/17,,14/15,true,false"));
        assert!(csv.contains("summary,conclusion,inconclusive"));
        assert!(csv.contains("summary,combined_index,2.0000"));
        assert!(csv.contains("summary,matching_loci,1/1"));
    }
}

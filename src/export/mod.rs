//! Report formatting: the genotype-profile record set and paternity
//! comparison as XML documents and flat CSV.

mod csv;
mod xml;

pub use csv::{comparison_csv, profile_csv, write_comparison_csv, write_profile_csv};
pub use xml::{comparison_to_xml, profiles_to_xml};

use std::io;

use crate::{paternity::Role, trace::Channel};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Container-level failure: bad signature, truncated or oversized file,
    /// out-of-bounds directory.
    #[error(transparent)]
    Format(#[from] abif_format::FormatError),

    /// No sizing curve is available for the channel a locus lives on.
    #[error("no sizing curve for locus {locus} on {channel}")]
    Calibration { locus: String, channel: Channel },

    /// A comparison role is missing its profile, or the profile carries fewer
    /// informative loci than the configured minimum.
    #[error("{role} profile is missing or has too few informative loci")]
    InsufficientData { role: Role },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("report serialization failed: {0}")]
    Export(#[from] quick_xml::SeError),

    #[error("{0}")]
    IOError(#[from] io::Error),
}

//! Resolving container entries into per-channel fluorescence traces.

use std::{collections::BTreeMap, fmt};

use abif_format::{Container, Tag};

use crate::error::Error;

/// Tag carrying raw channel samples; the tag number is the channel.
pub const DATA_TAG: Tag = Tag::new(b"DATA");
/// Tag carrying the sample name as a Pascal string.
pub const SAMPLE_NAME_TAG: Tag = Tag::new(b"SMPL");

/// The standard numbered data channels.
pub const DATA_CHANNELS: [u8; 4] = [1, 2, 3, 4];

/// A data channel number, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(pub u8);

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.0)
    }
}

/// One channel's ordered intensity samples, indexed by scan number.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub channel: Channel,
    pub dye: String,
    pub samples: Vec<i16>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Pull every recognized data channel out of a container.
///
/// A channel with no directory entry is simply absent from the result; some
/// runs legitimately record fewer than four dyes. A present entry that fails
/// to decode is a real error.
pub fn extract_traces(
    container: &Container,
    dyes: &BTreeMap<u8, String>,
) -> Result<BTreeMap<Channel, Trace>, Error> {
    let mut traces = BTreeMap::new();
    for ch in DATA_CHANNELS {
        let Some(entry) = container.entry(DATA_TAG, ch as u32) else {
            log::warn!("channel {ch} absent from container directory");
            continue;
        };
        let samples = container.read_i16s(entry)?;
        let dye = dyes.get(&ch).cloned().unwrap_or_else(|| format!("dye{ch}"));
        log::debug!("channel {ch} ({dye}): {} samples", samples.len());
        traces.insert(
            Channel(ch),
            Trace {
                channel: Channel(ch),
                dye,
                samples,
            },
        );
    }
    Ok(traces)
}

/// Sample name from the `SMPL 1` entry, when the instrument wrote one.
pub fn sample_name(container: &Container) -> Option<String> {
    let entry = container.entry(SAMPLE_NAME_TAG, 1)?;
    container.read_pascal_string(entry).ok()
}

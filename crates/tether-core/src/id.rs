//! Strongly-typed identifiers.

use std::fmt;

/// Sequence number assigned to a command when it enters the queue.
///
/// Allocated from a single monotonic counter per queue, so two commands
/// submitted through the same queue never share a sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandSeq(pub u64);

impl fmt::Display for CommandSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for CommandSeq {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a material region of the simulation mesh.
///
/// Regions are numbered `0..=255`; region 0 is the default region every
/// cell belongs to until reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u8);

impl RegionId {
    /// Number of addressable regions.
    pub const COUNT: usize = 256;
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for RegionId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Which regions a parameter display or edit addresses.
///
/// The control page encodes this as an integer: `-1` means all regions,
/// `0..=255` a single region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegionSelection {
    /// Every region at once.
    #[default]
    All,
    /// One specific region.
    One(RegionId),
}

impl RegionSelection {
    /// Decode the page's integer encoding. Returns `None` for values
    /// outside `-1..=255`.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            -1 => Some(Self::All),
            0..=255 => Some(Self::One(RegionId(index as u8))),
            _ => None,
        }
    }

    /// Inverse of [`from_index`](Self::from_index).
    pub fn index(self) -> i64 {
        match self {
            Self::All => -1,
            Self::One(r) => i64::from(r.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_selection_round_trips_page_encoding() {
        assert_eq!(RegionSelection::from_index(-1), Some(RegionSelection::All));
        assert_eq!(
            RegionSelection::from_index(7),
            Some(RegionSelection::One(RegionId(7)))
        );
        assert_eq!(RegionSelection::One(RegionId(255)).index(), 255);
        assert_eq!(RegionSelection::All.index(), -1);
    }

    #[test]
    fn region_selection_rejects_out_of_range() {
        assert_eq!(RegionSelection::from_index(256), None);
        assert_eq!(RegionSelection::from_index(-2), None);
    }

    #[test]
    fn command_seq_display() {
        assert_eq!(CommandSeq(12).to_string(), "#12");
    }
}

//! Tracks: the physical segment between two stations.

use std::fmt;

use super::Station;

/// A track travelled from one station to another.
///
/// The same physical track can be ridden in either direction; `reverse`
/// gives the other direction. Code that marks tracks as used always marks
/// both directions together.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Track {
    pub from: Station,
    pub to: Station,
}

impl Track {
    pub fn new(from: Station, to: Station) -> Self {
        Self { from, to }
    }

    /// The same track in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Track({} {})", self.from, self.to)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.from, self.to)
    }
}

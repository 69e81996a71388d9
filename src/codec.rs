//! Cluster identity encoding.
//!
//! A cluster is addressed by the record it originated from: the seed's table
//! position at the level one zoom finer than the level the cluster first
//! appears on, plus that zoom. [`ClusterKey`] is the structured form; the public
//! integer id packs it as
//!
//! ```text
//! id = -((origin_position << 5 | origin_zoom) + 1)
//! ```
//!
//! Cluster ids are therefore always negative, which keeps them disjoint from
//! point ids (non-negative point store positions) without depending on how many
//! points the index holds. Inserting points never changes an existing id.

use crate::error::{ClusterError, Result};

/// Number of bits reserved for the origin zoom.
pub const ZOOM_BITS: u32 = 5;

/// Highest `max_zoom` a configuration may use; level `max_zoom + 1` must still fit.
pub const MAX_ZOOM_LIMIT: u8 = (1 << ZOOM_BITS) - 2;

/// Largest origin position that can be packed without overflow.
pub const MAX_ORIGIN_POSITION: usize = (i64::MAX >> ZOOM_BITS) as usize;

const ZOOM_MASK: i64 = (1 << ZOOM_BITS) - 1;

/// Decoded cluster identity.
///
/// Ordered by origin zoom first, then by origin position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterKey {
    origin_zoom: u8,
    origin_position: usize,
}

impl ClusterKey {
    /// Build a key, validating that it can be packed into an id.
    pub fn new(origin_position: usize, origin_zoom: u8) -> Result<Self> {
        if origin_zoom > ZOOM_MASK as u8 || origin_position > MAX_ORIGIN_POSITION {
            return Err(ClusterError::InvalidInput(format!(
                "cluster origin ({origin_position}, {origin_zoom}) is out of encodable range"
            )));
        }
        Ok(Self {
            origin_zoom,
            origin_position,
        })
    }

    /// Record position at the origin level.
    pub fn origin_position(&self) -> usize {
        self.origin_position
    }

    /// Zoom level the originating record lives on.
    pub fn origin_zoom(&self) -> u8 {
        self.origin_zoom
    }

    /// Pack into the public integer id.
    pub fn to_id(self) -> i64 {
        let packed = ((self.origin_position as i64) << ZOOM_BITS) | i64::from(self.origin_zoom);
        -packed - 1
    }

    /// Unpack a public id, failing for values outside the cluster id space.
    pub fn from_id(id: i64) -> Result<Self> {
        if id >= 0 {
            return Err(ClusterError::InvalidClusterId(id));
        }
        // id <= -1, so -(id + 1) never overflows.
        let packed = -(id + 1);
        Ok(Self {
            origin_zoom: (packed & ZOOM_MASK) as u8,
            origin_position: (packed >> ZOOM_BITS) as usize,
        })
    }
}

impl From<ClusterKey> for i64 {
    fn from(key: ClusterKey) -> Self {
        key.to_id()
    }
}

impl TryFrom<i64> for ClusterKey {
    type Error = ClusterError;

    fn try_from(id: i64) -> Result<Self> {
        Self::from_id(id)
    }
}

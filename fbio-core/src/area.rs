//! Rectangular pixel regions
//!
//! Areas are half-open: `x1..x2` by `y1..y2`. Constructors normalize the
//! corners so `x1 <= x2` and `y1 <= y2` always hold.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum dirty areas reported for one refresh
///
/// Scenes that produce more fall back to a full refresh.
pub const MAX_REFRESH_AREAS: usize = 16;

/// Half-open pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Area {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

impl Area {
    /// Zero-sized area at the origin
    pub const EMPTY: Area = Area {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    /// Create an area from two corners
    pub fn new(x1: i16, y1: i16, x2: i16, y2: i16) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Create an area from an origin and a size
    pub fn from_size(x: i16, y: i16, width: u16, height: u16) -> Self {
        let x2 = (i32::from(x) + i32::from(width)).min(i32::from(i16::MAX)) as i16;
        let y2 = (i32::from(y) + i32::from(height)).min(i32::from(i16::MAX)) as i16;
        Self::new(x, y, x2, y2)
    }

    /// Width in pixels
    pub fn width(&self) -> u16 {
        (i32::from(self.x2) - i32::from(self.x1)) as u16
    }

    /// Height in pixels
    pub fn height(&self) -> u16 {
        (i32::from(self.y2) - i32::from(self.y1)) as u16
    }

    /// Pixel count
    pub fn size(&self) -> u32 {
        u32::from(self.width()) * u32::from(self.height())
    }

    /// True if the area covers no pixels
    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Overlap of two areas
    ///
    /// Returns `None` when the areas do not overlap or only touch.
    pub fn clip(&self, other: &Area) -> Option<Area> {
        let clipped = Area {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };

        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }

    /// Check if a pixel lies inside the area
    pub fn contains(&self, x: i16, y: i16) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Bounding box of two areas (empty areas are ignored)
    pub fn union(&self, other: &Area) -> Area {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Move the area by an offset
    pub fn translate(&self, dx: i16, dy: i16) -> Area {
        Area {
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
            x2: self.x2.saturating_add(dx),
            y2: self.y2.saturating_add(dy),
        }
    }
}

/// Returned when an [`AreaList`] is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityError;

/// Ordered, bounded list of dirty areas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaList {
    areas: Vec<Area, MAX_REFRESH_AREAS>,
}

impl AreaList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self { areas: Vec::new() }
    }

    /// List holding a single area
    pub fn single(area: Area) -> Self {
        let mut list = Self::new();
        // Capacity is at least one
        let _ = list.areas.push(area);
        list
    }

    /// Append an area; empty areas are dropped
    pub fn push(&mut self, area: Area) -> Result<(), CapacityError> {
        if area.is_empty() {
            return Ok(());
        }
        self.areas.push(area).map_err(|_| CapacityError)
    }

    /// Remove all areas
    pub fn clear(&mut self) {
        self.areas.clear();
    }

    /// Number of areas
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// True if nothing is dirty
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter()
    }

    /// View as a slice
    pub fn as_slice(&self) -> &[Area] {
        &self.areas
    }

    /// Total pixels across all areas (overlaps counted twice)
    pub fn total_size(&self) -> u32 {
        self.areas.iter().map(Area::size).sum()
    }
}

impl<'a> IntoIterator for &'a AreaList {
    type Item = &'a Area;
    type IntoIter = core::slice::Iter<'a, Area>;

    fn into_iter(self) -> Self::IntoIter {
        self.areas.iter()
    }
}

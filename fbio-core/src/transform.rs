//! Display rotation and the scene-to-framebuffer transform

use crate::area::Area;
use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Display rotation, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees
    pub const fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True for 90 and 270, where rows and columns swap
    pub const fn is_transposed(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = ConfigError;

    /// Accepts any multiple of 90; values wrap at 360
    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees % 360 {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(ConfigError::InvalidRotation(degrees)),
        }
    }
}

/// Maps scene coordinates onto framebuffer coordinates
///
/// Scene pixel `(x, y)` lands on framebuffer pixel
/// `(self.x + dx * a, self.y + dy * b)`, where `(a, b)` is `(x, y)` or
/// `(y, x)` when `transpose_xy` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transform {
    pub x: i16,
    pub y: i16,
    pub dx: i8,
    pub dy: i8,
    pub scale: u8,
    pub transpose_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// No rotation, no scaling
    pub const fn identity() -> Self {
        Self {
            x: 0,
            y: 0,
            dx: 1,
            dy: 1,
            scale: 1,
            transpose_xy: false,
            mirror_x: false,
            mirror_y: false,
        }
    }

    /// Transform for a framebuffer of `native_width` x `native_height`
    /// shown at `rotation`
    pub fn for_rotation(rotation: Rotation, native_width: u16, native_height: u16) -> Self {
        let mut t = Self::identity();
        match rotation {
            Rotation::Deg0 => {}
            Rotation::Deg90 => {
                t.transpose_xy = true;
                t.mirror_x = true;
            }
            Rotation::Deg180 => {
                t.mirror_x = true;
                t.mirror_y = true;
            }
            Rotation::Deg270 => {
                t.transpose_xy = true;
                t.mirror_y = true;
            }
        }

        if t.mirror_x {
            t.x = native_width as i16 - 1;
            t.dx = -1;
        }
        if t.mirror_y {
            t.y = native_height as i16 - 1;
            t.dy = -1;
        }
        t
    }

    /// Map a scene pixel to a framebuffer pixel
    pub fn apply(&self, x: i16, y: i16) -> (i16, i16) {
        let (a, b) = if self.transpose_xy { (y, x) } else { (x, y) };
        let scale = i16::from(self.scale);
        (
            self.x + i16::from(self.dx) * a * scale,
            self.y + i16::from(self.dy) * b * scale,
        )
    }

    /// Map a scene area to the framebuffer area it covers
    pub fn apply_area(&self, area: &Area) -> Area {
        if area.is_empty() {
            return Area::EMPTY;
        }
        let (ax, ay) = self.apply(area.x1, area.y1);
        let (bx, by) = self.apply(area.x2 - 1, area.y2 - 1);
        let scale = i16::from(self.scale);
        Area::new(ax.min(bx), ay.min(by), ax.max(bx) + scale, ay.max(by) + scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_parse() {
        assert_eq!(Rotation::try_from(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::try_from(270), Ok(Rotation::Deg270));
        assert_eq!(Rotation::try_from(450), Ok(Rotation::Deg90));
        assert_eq!(
            Rotation::try_from(45),
            Err(ConfigError::InvalidRotation(45))
        );
    }

    #[test]
    fn test_identity() {
        let t = Transform::for_rotation(Rotation::Deg0, 240, 135);
        assert_eq!(t, Transform::identity());
        assert_eq!(t.apply(5, 7), (5, 7));
    }

    #[test]
    fn test_rotation_180_corners() {
        let t = Transform::for_rotation(Rotation::Deg180, 240, 135);
        assert_eq!(t.apply(0, 0), (239, 134));
        assert_eq!(t.apply(239, 134), (0, 0));
    }

    #[test]
    fn test_rotation_90_maps_into_native_bounds() {
        // Logical display is 135 wide, 240 tall
        let t = Transform::for_rotation(Rotation::Deg90, 240, 135);
        assert_eq!(t.apply(0, 0), (239, 0));
        assert_eq!(t.apply(134, 239), (0, 134));
    }

    #[test]
    fn test_rotation_270_maps_into_native_bounds() {
        let t = Transform::for_rotation(Rotation::Deg270, 240, 135);
        assert_eq!(t.apply(0, 0), (0, 134));
        assert_eq!(t.apply(134, 239), (239, 0));
    }

    #[test]
    fn test_apply_area_rotated() {
        let t = Transform::for_rotation(Rotation::Deg90, 240, 135);
        // Full logical display maps onto the full framebuffer
        let full = t.apply_area(&Area::new(0, 0, 135, 240));
        assert_eq!(full, Area::new(0, 0, 240, 135));

        let small = t.apply_area(&Area::new(0, 0, 10, 20));
        assert_eq!(small.width(), 20);
        assert_eq!(small.height(), 10);
    }
}

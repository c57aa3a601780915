//! Demo scene: a square bouncing around a solid background
//!
//! Only the square's old and new positions are reported dirty, so each
//! frame is a partial refresh of two small areas.

use heapless::Vec;

use fbio_core::pixel::{set_mask, write_pixel};
use fbio_core::{Area, AreaList, CapacityError, Colorspace, Scene, Transform};

/// RGB565 colors
const BACKGROUND: u32 = 0x0010;
const FOREGROUND: u32 = 0xFFE0;

const SQUARE_SIZE: u16 = 24;

pub struct BouncingSquare {
    /// Logical display size
    width: u16,
    height: u16,
    x: i16,
    y: i16,
    dx: i16,
    dy: i16,
    transform: Transform,
    /// Framebuffer areas changed since the last refresh
    dirty: Vec<Area, 4>,
    /// More changes than `dirty` could hold
    overflowed: bool,
}

impl BouncingSquare {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            dx: 2,
            dy: 1,
            transform: Transform::identity(),
            dirty: Vec::new(),
            overflowed: false,
        }
    }

    /// Advance one frame
    pub fn step(&mut self) {
        let before = self.square();

        let max_x = self.width.saturating_sub(SQUARE_SIZE) as i16;
        let max_y = self.height.saturating_sub(SQUARE_SIZE) as i16;
        self.x += self.dx;
        self.y += self.dy;
        if self.x <= 0 || self.x >= max_x {
            self.dx = -self.dx;
            self.x = self.x.clamp(0, max_x);
        }
        if self.y <= 0 || self.y >= max_y {
            self.dy = -self.dy;
            self.y = self.y.clamp(0, max_y);
        }

        let after = self.square();
        self.mark_dirty(before);
        self.mark_dirty(after);
    }

    /// Square in framebuffer coordinates
    fn square(&self) -> Area {
        let square = Area::from_size(0, 0, SQUARE_SIZE, SQUARE_SIZE).translate(self.x, self.y);
        self.transform.apply_area(&square)
    }

    fn mark_dirty(&mut self, area: Area) {
        if self.dirty.contains(&area) {
            return;
        }
        if self.dirty.push(area).is_err() {
            self.overflowed = true;
        }
    }
}

impl Scene for BouncingSquare {
    fn refresh_areas(&self, areas: &mut AreaList) -> Result<(), CapacityError> {
        if self.overflowed {
            return Err(CapacityError);
        }
        for area in &self.dirty {
            areas.push(*area)?;
        }
        Ok(())
    }

    fn fill_area(
        &self,
        colorspace: &Colorspace,
        area: &Area,
        mask: &mut [u32],
        buffer: &mut [u32],
    ) -> bool {
        let square = self.square();
        let width = usize::from(area.width());
        for i in 0..area.size() as usize {
            let x = area.x1 + (i % width) as i16;
            let y = area.y1 + (i / width) as i16;
            let color = if square.contains(x, y) {
                FOREGROUND
            } else {
                BACKGROUND
            };
            write_pixel(buffer, i, colorspace, color);
            set_mask(mask, i);
        }
        true
    }

    fn update_transform(&mut self, transform: &Transform) {
        self.transform = *transform;
    }

    fn finish_refresh(&mut self) {
        self.dirty.clear();
        self.overflowed = false;
    }
}

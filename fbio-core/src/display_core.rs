//! Display geometry and the currently shown scene
//!
//! The display core is the single source of truth for a display's size,
//! rotation and pixel format, and tracks which scene root is shown and
//! whether the next refresh must redraw everything.

use crate::area::{Area, AreaList};
use crate::colorspace::Colorspace;
use crate::error::ConfigError;
use crate::scene::{Scene, SceneHandle, SceneSlots};
use crate::transform::{Rotation, Transform};

/// Display geometry and refresh bookkeeping
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayCore {
    /// Framebuffer width, independent of rotation
    native_width: u16,
    /// Framebuffer height, independent of rotation
    native_height: u16,
    /// Width as seen by the scene
    width: u16,
    /// Height as seen by the scene
    height: u16,
    rotation: Rotation,
    colorspace: Colorspace,
    transform: Transform,
    /// Whole framebuffer, in framebuffer coordinates
    area: Area,
    current: Option<SceneHandle>,
    full_refresh: bool,
    refresh_in_progress: bool,
    last_refresh_ms: u64,
}

impl DisplayCore {
    /// Create a display core for a `width` x `height` framebuffer
    ///
    /// Only byte-aligned color depths are accepted: pixels are copied into
    /// byte-addressed framebuffer memory.
    pub fn new(
        width: u16,
        height: u16,
        rotation: Rotation,
        colorspace: Colorspace,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 || width > i16::MAX as u16 || height > i16::MAX as u16 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !colorspace.is_byte_aligned() {
            return Err(ConfigError::UnsupportedDepth(colorspace.depth));
        }

        let (logical_width, logical_height) = if rotation.is_transposed() {
            (height, width)
        } else {
            (width, height)
        };

        Ok(Self {
            native_width: width,
            native_height: height,
            width: logical_width,
            height: logical_height,
            rotation,
            colorspace,
            transform: Transform::for_rotation(rotation, width, height),
            area: Area::from_size(0, 0, width, height),
            current: None,
            full_refresh: true,
            refresh_in_progress: false,
            last_refresh_ms: 0,
        })
    }

    /// Width as seen by the scene
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height as seen by the scene
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Framebuffer (unrotated) size
    pub fn native_size(&self) -> (u16, u16) {
        (self.native_width, self.native_height)
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Pixel format
    pub fn colorspace(&self) -> &Colorspace {
        &self.colorspace
    }

    /// Scene-to-framebuffer transform for the current rotation
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Whole display in framebuffer coordinates
    pub fn bounds(&self) -> Area {
        self.area
    }

    /// Handle of the shown root, if any
    pub fn current(&self) -> Option<SceneHandle> {
        self.current
    }

    /// True if the next refresh redraws the whole display
    pub fn full_refresh_pending(&self) -> bool {
        self.full_refresh
    }

    /// True between `start_refresh` and `finish_refresh`
    pub fn refresh_in_progress(&self) -> bool {
        self.refresh_in_progress
    }

    /// Completion time of the last refresh
    pub fn last_refresh_ms(&self) -> u64 {
        self.last_refresh_ms
    }

    /// Force the next refresh to redraw everything
    pub fn request_full_refresh(&mut self) {
        self.full_refresh = true;
    }

    /// Show `root`, or nothing for `None`
    ///
    /// Returns `false` without changing anything if `root` is stale or
    /// already shown on another display.
    pub fn show<S: Scene, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        root: Option<SceneHandle>,
    ) -> bool {
        if root.is_some() && root == self.current && root.is_some_and(|h| slots.contains(h)) {
            return true;
        }

        if let Some(handle) = root {
            if !slots.contains(handle) || slots.is_attached(handle) {
                return false;
            }
        }

        if let Some(previous) = self.current.take() {
            slots.set_attached(previous, false);
        }

        if let Some(handle) = root {
            slots.set_attached(handle, true);
            if let Some(scene) = slots.get_mut(handle) {
                scene.update_transform(&self.transform);
            }
            self.current = Some(handle);
        }

        self.full_refresh = true;
        true
    }

    /// Change rotation
    ///
    /// Swaps width and height when moving between portrait and landscape
    /// orientations and pushes the new transform to the shown root.
    pub fn set_rotation<S: Scene, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        rotation: Rotation,
    ) {
        if self.rotation.is_transposed() != rotation.is_transposed() {
            core::mem::swap(&mut self.width, &mut self.height);
        }

        self.rotation = rotation;
        self.transform = Transform::for_rotation(rotation, self.native_width, self.native_height);

        if let Some(scene) = self.current.and_then(|h| slots.get_mut(h)) {
            scene.update_transform(&self.transform);
        }
        self.full_refresh = true;
    }

    /// Areas to redraw on the next refresh
    ///
    /// A pending full refresh yields exactly the display bounds. Otherwise
    /// the shown root's dirty areas are returned; if they do not fit, the
    /// whole display is redrawn instead.
    pub fn refresh_areas<S: Scene, const N: usize>(&self, slots: &SceneSlots<S, N>) -> AreaList {
        if self.full_refresh {
            return AreaList::single(self.area);
        }

        let Some(scene) = self.current.and_then(|h| slots.get(h)) else {
            return AreaList::new();
        };

        let mut areas = AreaList::new();
        match scene.refresh_areas(&mut areas) {
            Ok(()) => areas,
            Err(_) => AreaList::single(self.area),
        }
    }

    /// Clip an area to the display
    pub fn clip_area(&self, area: &Area) -> Option<Area> {
        self.area.clip(area)
    }

    /// Paint `area` from the shown root
    ///
    /// Returns `false` if no root is shown or nothing was drawn.
    pub fn fill_area<S: Scene, const N: usize>(
        &self,
        slots: &SceneSlots<S, N>,
        area: &Area,
        mask: &mut [u32],
        buffer: &mut [u32],
    ) -> bool {
        match self.current.and_then(|h| slots.get(h)) {
            Some(scene) => scene.fill_area(&self.colorspace, area, mask, buffer),
            None => false,
        }
    }

    /// Mark the start of a refresh
    pub fn start_refresh(&mut self) {
        self.refresh_in_progress = true;
    }

    /// Mark the end of a refresh finished at `now_ms`
    pub fn finish_refresh<S: Scene, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        now_ms: u64,
    ) {
        if let Some(scene) = self.current.and_then(|h| slots.get_mut(h)) {
            scene.finish_refresh();
        }
        self.full_refresh = false;
        self.refresh_in_progress = false;
        self.last_refresh_ms = now_ms;
    }

    /// Detach the shown root
    pub fn release<S: Scene, const N: usize>(&mut self, slots: &mut SceneSlots<S, N>) {
        if let Some(previous) = self.current.take() {
            slots.set_attached(previous, false);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::area::CapacityError;
    use crate::pixel::{set_mask, write_pixel};

    /// Scene that fills a solid color and reports a fixed set of dirty areas
    pub(crate) struct SolidScene {
        pub color: u32,
        pub dirty: heapless::Vec<Area, 32>,
        pub transform: Transform,
        pub finished: u32,
    }

    impl SolidScene {
        pub fn new(color: u32) -> Self {
            Self {
                color,
                dirty: heapless::Vec::new(),
                transform: Transform::identity(),
                finished: 0,
            }
        }
    }

    impl Scene for SolidScene {
        fn refresh_areas(&self, areas: &mut AreaList) -> Result<(), CapacityError> {
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
            for i in 0..area.size() as usize {
                write_pixel(buffer, i, colorspace, self.color);
                set_mask(mask, i);
            }
            true
        }

        fn update_transform(&mut self, transform: &Transform) {
            self.transform = *transform;
        }

        fn finish_refresh(&mut self) {
            self.dirty.clear();
            self.finished += 1;
        }
    }

    fn rgb565() -> Colorspace {
        Colorspace::new(16, 1).unwrap()
    }

    fn core() -> DisplayCore {
        DisplayCore::new(240, 135, Rotation::Deg0, rgb565()).unwrap()
    }

    #[test]
    fn test_construct_rejects_bad_geometry() {
        assert_eq!(
            DisplayCore::new(0, 135, Rotation::Deg0, rgb565()).unwrap_err(),
            ConfigError::InvalidDimensions
        );
        let mono = Colorspace::new(1, 1).unwrap();
        assert_eq!(
            DisplayCore::new(128, 64, Rotation::Deg0, mono).unwrap_err(),
            ConfigError::UnsupportedDepth(1)
        );
    }

    #[test]
    fn test_construct_rotated_swaps_logical_size() {
        let core = DisplayCore::new(240, 135, Rotation::Deg90, rgb565()).unwrap();
        assert_eq!((core.width(), core.height()), (135, 240));
        assert_eq!(core.native_size(), (240, 135));
        assert_eq!(core.bounds(), Area::new(0, 0, 240, 135));
    }

    #[test]
    fn test_full_refresh_returns_bounds() {
        let mut slots: SceneSlots<SolidScene, 2> = SceneSlots::new();
        let mut scene = SolidScene::new(0);
        let _ = scene.dirty.push(Area::new(0, 0, 5, 5));
        let root = slots.insert(scene).ok().unwrap();

        let mut core = core();
        assert!(core.show(&mut slots, Some(root)));
        assert!(core.full_refresh_pending());

        let areas = core.refresh_areas(&slots);
        assert_eq!(areas.as_slice(), &[Area::new(0, 0, 240, 135)]);
    }

    #[test]
    fn test_partial_refresh_delegates_to_scene() {
        let mut slots: SceneSlots<SolidScene, 2> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));
        core.start_refresh();
        core.finish_refresh(&mut slots, 10);
        assert!(!core.full_refresh_pending());
        assert!(core.refresh_areas(&slots).is_empty());

        let scene = slots.get_mut(root).unwrap();
        let _ = scene.dirty.push(Area::new(1, 2, 3, 4));
        let _ = scene.dirty.push(Area::new(10, 10, 20, 20));

        let areas = core.refresh_areas(&slots);
        assert_eq!(
            areas.as_slice(),
            &[Area::new(1, 2, 3, 4), Area::new(10, 10, 20, 20)]
        );
    }

    #[test]
    fn test_dirty_overflow_falls_back_to_full() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));
        core.finish_refresh(&mut slots, 0);

        let scene = slots.get_mut(root).unwrap();
        for i in 0..20 {
            let _ = scene.dirty.push(Area::new(i, 0, i + 1, 1));
        }
        assert_eq!(core.refresh_areas(&slots).as_slice(), &[core.bounds()]);
    }

    #[test]
    fn test_no_root_no_areas() {
        let slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let mut core = core();
        core.full_refresh = false;
        assert!(core.refresh_areas(&slots).is_empty());
        assert!(!core.fill_area(&slots, &Area::new(0, 0, 1, 1), &mut [0], &mut [0]));
    }

    #[test]
    fn test_show_rejects_root_attached_elsewhere() {
        let mut slots: SceneSlots<SolidScene, 2> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();

        let mut first = core();
        let mut second = core();
        assert!(first.show(&mut slots, Some(root)));
        assert!(!second.show(&mut slots, Some(root)));
        assert_eq!(second.current(), None);

        // Showing the same root again is fine
        assert!(first.show(&mut slots, Some(root)));

        // Once released it can move
        assert!(first.show(&mut slots, None));
        assert!(!slots.is_attached(root));
        assert!(second.show(&mut slots, Some(root)));
    }

    #[test]
    fn test_show_stale_handle_fails() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        slots.remove(root);
        let mut core = core();
        assert!(!core.show(&mut slots, Some(root)));
    }

    #[test]
    fn test_removed_root_treated_as_absent() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));
        slots.remove(root);
        assert!(!core.fill_area(&slots, &Area::new(0, 0, 1, 1), &mut [0], &mut [0]));
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));

        core.set_rotation(&mut slots, Rotation::Deg90);
        assert_eq!((core.width(), core.height()), (135, 240));
        assert!(slots.get(root).unwrap().transform.transpose_xy);

        core.set_rotation(&mut slots, Rotation::Deg270);
        assert_eq!((core.width(), core.height()), (135, 240));

        core.set_rotation(&mut slots, Rotation::Deg0);
        assert_eq!((core.width(), core.height()), (240, 135));
        assert_eq!(slots.get(root).unwrap().transform, Transform::identity());
        assert_eq!(core.bounds(), Area::new(0, 0, 240, 135));
    }

    #[test]
    fn test_finish_refresh_records_time_and_notifies_scene() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));

        core.start_refresh();
        assert!(core.refresh_in_progress());
        core.finish_refresh(&mut slots, 1234);
        assert!(!core.refresh_in_progress());
        assert_eq!(core.last_refresh_ms(), 1234);
        assert_eq!(slots.get(root).unwrap().finished, 1);
    }

    #[test]
    fn test_request_full_refresh_overrides_dirty_areas() {
        let mut slots: SceneSlots<SolidScene, 1> = SceneSlots::new();
        let root = slots.insert(SolidScene::new(0)).ok().unwrap();
        let mut core = core();
        core.show(&mut slots, Some(root));
        core.finish_refresh(&mut slots, 0);
        assert!(!core.full_refresh_pending());

        let dirty = Area::new(0, 0, 5, 5);
        let _ = slots.get_mut(root).unwrap().dirty.push(dirty);
        assert_eq!(core.refresh_areas(&slots).as_slice(), &[dirty]);

        core.request_full_refresh();
        assert!(core.full_refresh_pending());
        assert_eq!(
            core.refresh_areas(&slots).as_slice(),
            &[Area::new(0, 0, 240, 135)]
        );
    }

    #[test]
    fn test_clip_area_outside_display() {
        let core = core();
        assert_eq!(core.clip_area(&Area::new(300, 0, 400, 10)), None);
        assert_eq!(
            core.clip_area(&Area::new(-10, -10, 10, 10)),
            Some(Area::new(0, 0, 10, 10))
        );
    }
}

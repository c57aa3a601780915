//! Framebuffer-backed display
//!
//! A refresh asks the display core which areas changed, cuts each one into
//! chunks that fit the fixed working buffer, lets the scene paint every chunk
//! and copies the result into framebuffer memory. The framebuffer is
//! presented once per refresh, after all chunks are written.

use fbio_core::config::DisplayConfig;
use fbio_core::pacing::{DeadlineMissed, FramePacer, PacingDecision};
use fbio_core::refresh::{copy_chunk, ChunkPlan, RefreshSession, WORKING_BUFFER_WORDS};
use fbio_core::{ConfigError, DisplayCore, Rotation, Scene, SceneHandle, SceneSlots};
use fbio_hal::{Background, Framebuffer, Monotonic};

use crate::terminal::Terminal;

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError<E> {
    /// Real refreshes fell further apart than the caller allows
    BelowMinimumFrameRate { elapsed_ms: u64, max_ms: u32 },
    /// Presenting the framebuffer failed
    Framebuffer(E),
}

impl<E> From<DeadlineMissed> for DisplayError<E> {
    fn from(missed: DeadlineMissed) -> Self {
        DisplayError::BelowMinimumFrameRate {
            elapsed_ms: missed.elapsed_ms,
            max_ms: missed.max_ms,
        }
    }
}

/// What the last refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshStats {
    /// Dirty areas that overlapped the display
    pub areas: u16,
    /// Chunks the scene was asked to paint
    pub chunks: u32,
    /// Pixels covered by those chunks
    pub pixels: u32,
}

/// Display driving a [`Framebuffer`]
pub struct FramebufferDisplay<FB, CLK, T> {
    framebuffer: FB,
    clock: CLK,
    terminal: T,
    core: DisplayCore,
    pacer: FramePacer,
    stats: RefreshStats,
}

impl<FB, CLK, T> FramebufferDisplay<FB, CLK, T>
where
    FB: Framebuffer,
    CLK: Monotonic,
    T: Terminal,
{
    /// Create a display over `framebuffer`
    ///
    /// Nothing is shown and nothing is written to the framebuffer until the
    /// first refresh.
    pub fn new(
        framebuffer: FB,
        clock: CLK,
        mut terminal: T,
        config: &DisplayConfig,
    ) -> Result<Self, ConfigError> {
        let colorspace = config.colorspace()?;
        let core = DisplayCore::new(config.width, config.height, config.rotation, colorspace)?;

        // Auto refresh stays off until everything is in place
        let mut pacer = FramePacer::new(false, config.native_frames_per_second)?;

        terminal.start(core.width(), core.height());
        pacer.set_auto_refresh(config.auto_refresh);

        debug!(
            "display {}x{} depth {} rotation {}",
            core.width(),
            core.height(),
            config.color_depth,
            config.rotation.degrees()
        );

        Ok(Self {
            framebuffer,
            clock,
            terminal,
            core,
            pacer,
            stats: RefreshStats::default(),
        })
    }

    /// Show `root` on this display, or nothing for `None`
    ///
    /// Returns `false` if the root is gone or already shown elsewhere.
    pub fn show<S: Scene, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        root: Option<SceneHandle>,
    ) -> bool {
        self.core.show(slots, root)
    }

    /// Currently shown root
    pub fn root(&self) -> Option<SceneHandle> {
        self.core.current()
    }

    /// Width as seen by the scene
    pub fn width(&self) -> u16 {
        self.core.width()
    }

    /// Height as seen by the scene
    pub fn height(&self) -> u16 {
        self.core.height()
    }

    pub fn rotation(&self) -> Rotation {
        self.core.rotation()
    }

    /// Rotate the display; the terminal is laid out again for the new size
    pub fn set_rotation<S: Scene, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        rotation: Rotation,
    ) {
        self.core.set_rotation(slots, rotation);
        self.terminal.stop();
        self.terminal.start(self.core.width(), self.core.height());
    }

    /// Refresh on request
    ///
    /// In manual mode calls are paced to `target_ms_per_frame` (0 for no
    /// limit): a call that comes too soon returns `Ok(false)` without touching
    /// the framebuffer, otherwise the call waits for the next frame boundary,
    /// running `background` meanwhile. The first manual refresh always goes
    /// through. If the last real refresh is more than `max_ms_per_real_frame`
    /// old the call fails.
    pub fn refresh<S, BG, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        background: &mut BG,
        target_ms_per_frame: u32,
        max_ms_per_real_frame: u32,
    ) -> Result<bool, DisplayError<FB::Error>>
    where
        S: Scene,
        BG: Background,
    {
        let now = self.clock.now_ms();
        let decision = self.pacer.decide(
            now,
            self.core.last_refresh_ms(),
            target_ms_per_frame,
            max_ms_per_real_frame,
        );

        match decision {
            Ok(PacingDecision::Refresh) => {}
            Ok(PacingDecision::Skip) => {
                trace!("refresh skipped at {=u64} ms", now);
                return Ok(false);
            }
            Ok(PacingDecision::WaitUntil(deadline)) => {
                while self.clock.now_ms() < deadline {
                    background.run();
                }
            }
            Err(missed) => {
                warn!(
                    "{=u64} ms since last refresh, limit {=u32} ms",
                    missed.elapsed_ms,
                    missed.max_ms
                );
                return Err(missed.into());
            }
        }

        self.refresh_display(slots, background)?;
        Ok(true)
    }

    pub fn auto_refresh(&self) -> bool {
        self.pacer.auto_refresh()
    }

    pub fn set_auto_refresh(&mut self, auto_refresh: bool) {
        self.pacer.set_auto_refresh(auto_refresh);
    }

    /// Periodic hook, called from the application's main loop
    ///
    /// Refreshes an auto-refreshing display once a native frame time has
    /// passed. Returns whether a refresh happened.
    pub fn background<S, BG, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        background: &mut BG,
    ) -> Result<bool, DisplayError<FB::Error>>
    where
        S: Scene,
        BG: Background,
    {
        self.update_backlight();

        let now = self.clock.now_ms();
        if !self.pacer.auto_refresh_due(now, self.core.last_refresh_ms()) {
            return Ok(false);
        }

        self.refresh_display(slots, background)?;
        Ok(true)
    }

    /// Backlight fading is not implemented; brightness changes apply
    /// immediately through [`Self::set_brightness`].
    fn update_backlight(&mut self) {}

    /// Current brightness, `None` if the framebuffer cannot dim
    pub fn brightness(&self) -> Option<f32> {
        self.framebuffer.brightness()
    }

    /// Returns `false` if the framebuffer cannot dim
    pub fn set_brightness(&mut self, brightness: f32) -> bool {
        self.framebuffer.set_brightness(brightness)
    }

    /// True unless the framebuffer reports manual brightness control
    pub fn auto_brightness(&self) -> bool {
        self.framebuffer.auto_brightness().unwrap_or(true)
    }

    /// Returns `false` if the framebuffer has no automatic brightness
    pub fn set_auto_brightness(&mut self, auto_brightness: bool) -> bool {
        self.framebuffer.set_auto_brightness(auto_brightness)
    }

    pub fn framebuffer(&self) -> &FB {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut FB {
        &mut self.framebuffer
    }

    /// Statistics of the most recent refresh
    pub fn last_refresh_stats(&self) -> RefreshStats {
        self.stats
    }

    /// Detach the shown root and shut the framebuffer down
    pub fn release<S: Scene, const N: usize>(&mut self, slots: &mut SceneSlots<S, N>) {
        self.core.release(slots);
        self.framebuffer.deinit();
    }

    /// Back to power-on behavior: auto refresh, nothing shown
    pub fn reset<S: Scene, const N: usize>(&mut self, slots: &mut SceneSlots<S, N>) {
        self.set_auto_refresh(true);
        self.show(slots, None);
    }

    fn refresh_display<S, BG, const N: usize>(
        &mut self,
        slots: &mut SceneSlots<S, N>,
        background: &mut BG,
    ) -> Result<(), DisplayError<FB::Error>>
    where
        S: Scene,
        BG: Background,
    {
        self.core.start_refresh();

        let areas = self.core.refresh_areas(slots);
        let colorspace = *self.core.colorspace();
        // Sub-byte depths are rejected when the core is built
        let bytes_per_pixel = colorspace.bytes_per_pixel().unwrap_or(1);

        let mut session = RefreshSession::new();
        let mut stats = RefreshStats::default();
        {
            let info = self.framebuffer.buffer_info();

            for area in &areas {
                let Some(clipped) = self.core.clip_area(area) else {
                    continue;
                };
                stats.areas += 1;

                let plan = ChunkPlan::new(&clipped, &colorspace, WORKING_BUFFER_WORDS);
                for chunk in plan.chunks() {
                    let (mask, buffer) = session.prepare(&plan);
                    // Undrawn pixels stay zero and still overwrite the old frame
                    self.core.fill_area(slots, &chunk, mask, buffer);
                    copy_chunk(
                        &chunk,
                        bytes_per_pixel,
                        session.buffer(),
                        info.buf,
                        info.stride,
                    );
                    stats.chunks += 1;
                    stats.pixels += chunk.size();
                    background.run();
                }
            }
        }

        let now = self.clock.now_ms();
        self.core.finish_refresh(slots, now);
        self.stats = stats;
        trace!(
            "refreshed {=u16} areas, {=u32} chunks, {=u32} px",
            stats.areas,
            stats.chunks,
            stats.pixels
        );

        self.framebuffer
            .swap_buffers()
            .map_err(DisplayError::Framebuffer)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use fbio_core::pixel::{set_mask, write_pixel};
    use fbio_core::{Area, AreaList, CapacityError, Colorspace, Transform};
    use fbio_hal::BufferInfo;
    use std::vec;
    use std::vec::Vec;

    use crate::terminal::NoTerminal;

    struct MockFramebuffer {
        pixels: Vec<u8>,
        stride: usize,
        swaps: u32,
        fail_swap: bool,
        deinit: bool,
        brightness: Option<f32>,
    }

    impl MockFramebuffer {
        fn new(width: usize, height: usize) -> Self {
            Self {
                pixels: vec![0; width * 2 * height],
                stride: width * 2,
                swaps: 0,
                fail_swap: false,
                deinit: false,
                brightness: None,
            }
        }

        fn pixel(&self, x: usize, y: usize) -> u16 {
            let i = y * self.stride + x * 2;
            u16::from_le_bytes([self.pixels[i], self.pixels[i + 1]])
        }
    }

    impl Framebuffer for MockFramebuffer {
        type Error = ();

        fn buffer_info(&mut self) -> BufferInfo<'_> {
            BufferInfo::new(&mut self.pixels, self.stride)
        }

        fn swap_buffers(&mut self) -> Result<(), ()> {
            if self.fail_swap {
                return Err(());
            }
            self.swaps += 1;
            Ok(())
        }

        fn deinit(&mut self) {
            self.deinit = true;
        }

        fn brightness(&self) -> Option<f32> {
            self.brightness
        }

        fn set_brightness(&mut self, brightness: f32) -> bool {
            match self.brightness {
                Some(_) => {
                    self.brightness = Some(brightness);
                    true
                }
                None => false,
            }
        }
    }

    /// Clock that only moves when told to, or by `step` per reading
    struct MockClock {
        now: Cell<u64>,
        step: Cell<u64>,
    }

    impl MockClock {
        fn new(now: u64) -> Self {
            Self {
                now: Cell::new(now),
                step: Cell::new(0),
            }
        }

        fn set(&self, now: u64) {
            self.now.set(now);
        }
    }

    impl Monotonic for MockClock {
        fn now_ms(&self) -> u64 {
            let now = self.now.get();
            self.now.set(now + self.step.get());
            now
        }
    }

    #[derive(Default)]
    struct MockTerminal {
        starts: Vec<(u16, u16)>,
        stops: u32,
    }

    impl Terminal for MockTerminal {
        fn start(&mut self, width: u16, height: u16) {
            self.starts.push((width, height));
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    /// Paints each pixel with its framebuffer coordinates, counting coverage
    struct CoordScene {
        dirty: Vec<Area>,
        painted: Cell<u32>,
        transform: Transform,
    }

    impl CoordScene {
        fn new() -> Self {
            Self {
                dirty: Vec::new(),
                painted: Cell::new(0),
                transform: Transform::identity(),
            }
        }

        fn color(x: i16, y: i16) -> u32 {
            ((y as u32) << 8) | x as u32 & 0xFF
        }
    }

    impl Scene for CoordScene {
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
            let width = i32::from(area.width());
            for i in 0..area.size() as usize {
                let x = area.x1 + (i as i32 % width) as i16;
                let y = area.y1 + (i as i32 / width) as i16;
                write_pixel(buffer, i, colorspace, Self::color(x, y));
                set_mask(mask, i);
            }
            self.painted.set(self.painted.get() + area.size());
            true
        }

        fn update_transform(&mut self, transform: &Transform) {
            self.transform = *transform;
        }

        fn finish_refresh(&mut self) {
            self.dirty.clear();
        }
    }

    type TestDisplay<'a> = FramebufferDisplay<MockFramebuffer, &'a MockClock, MockTerminal>;

    fn config(auto_refresh: bool) -> DisplayConfig {
        DisplayConfig {
            auto_refresh,
            ..DisplayConfig::default()
        }
    }

    fn display(clock: &MockClock, auto_refresh: bool) -> TestDisplay<'_> {
        FramebufferDisplay::new(
            MockFramebuffer::new(240, 135),
            clock,
            MockTerminal::default(),
            &config(auto_refresh),
        )
        .unwrap()
    }

    fn slots_with_scene() -> (SceneSlots<CoordScene, 2>, SceneHandle) {
        let mut slots = SceneSlots::new();
        let root = slots.insert(CoordScene::new()).ok().unwrap();
        (slots, root)
    }

    #[test]
    fn test_construct_starts_terminal_and_applies_mode() {
        let clock = MockClock::new(0);
        let display = display(&clock, false);
        assert_eq!(display.terminal.starts, vec![(240, 135)]);
        assert!(!display.auto_refresh());
        assert_eq!(display.framebuffer().swaps, 0);
        assert!(display.framebuffer().pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_construct_rejects_sub_byte_depth() {
        let clock = MockClock::new(0);
        let config = DisplayConfig {
            color_depth: 1,
            ..DisplayConfig::default()
        };
        let result = FramebufferDisplay::new(
            MockFramebuffer::new(240, 135),
            &clock,
            NoTerminal,
            &config,
        );
        assert_eq!(result.err(), Some(ConfigError::UnsupportedDepth(1)));
    }

    #[test]
    fn test_full_refresh_covers_display_once() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        assert!(display.show(&mut slots, Some(root)));

        let mut yields = 0;
        let refreshed = display
            .refresh(&mut slots, &mut || yields += 1, 16, 1000)
            .unwrap();
        assert!(refreshed);

        let stats = display.last_refresh_stats();
        assert_eq!(stats.areas, 1);
        assert_eq!(stats.chunks, 135);
        assert_eq!(stats.pixels, 240 * 135);
        assert_eq!(yields, 135);
        assert_eq!(slots.get(root).unwrap().painted.get(), 240 * 135);

        let fb = display.framebuffer();
        assert_eq!(fb.swaps, 1);
        assert_eq!(u32::from(fb.pixel(0, 0)), CoordScene::color(0, 0));
        assert_eq!(u32::from(fb.pixel(239, 134)), CoordScene::color(239, 134));
        assert_eq!(u32::from(fb.pixel(17, 99)), CoordScene::color(17, 99));
    }

    #[test]
    fn test_partial_refresh_only_touches_dirty_area() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));
        display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap();

        display.framebuffer_mut().pixels.fill(0);
        slots
            .get_mut(root)
            .unwrap()
            .dirty
            .push(Area::new(10, 10, 20, 12));

        clock.set(20);
        assert!(display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap());
        let stats = display.last_refresh_stats();
        assert_eq!(stats.pixels, 20);

        let fb = display.framebuffer();
        assert_eq!(u32::from(fb.pixel(10, 10)), CoordScene::color(10, 10));
        assert_eq!(u32::from(fb.pixel(19, 11)), CoordScene::color(19, 11));
        assert_eq!(fb.pixel(20, 11), 0);
        assert_eq!(fb.pixel(0, 0), 0);
    }

    #[test]
    fn test_dirty_area_clipped_to_display() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));
        display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap();

        let scene = slots.get_mut(root).unwrap();
        scene.dirty.push(Area::new(230, 130, 300, 200));
        scene.dirty.push(Area::new(400, 400, 500, 500));

        clock.set(10);
        display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap();
        let stats = display.last_refresh_stats();
        assert_eq!(stats.areas, 1);
        assert_eq!(stats.pixels, 10 * 5);
    }

    #[test]
    fn test_first_manual_refresh_always_runs() {
        let clock = MockClock::new(5);
        let mut display = display(&clock, false);
        let (mut slots, _) = slots_with_scene();

        // Inside the target window and past the deadline, still refreshes
        assert!(display.refresh(&mut slots, &mut || {}, 1000, 1).unwrap());
        assert_eq!(display.framebuffer().swaps, 1);
    }

    #[test]
    fn test_manual_refresh_too_soon_skips() {
        let clock = MockClock::new(1000);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));
        assert!(display.refresh(&mut slots, &mut || {}, 16, 1000).unwrap());

        clock.set(1005);
        assert!(!display.refresh(&mut slots, &mut || {}, 16, 1000).unwrap());
        assert_eq!(display.framebuffer().swaps, 1);
    }

    #[test]
    fn test_manual_refresh_past_deadline_fails() {
        let clock = MockClock::new(1000);
        let mut display = display(&clock, false);
        let (mut slots, _) = slots_with_scene();
        display.refresh(&mut slots, &mut || {}, 16, 1000).unwrap();

        clock.set(3000);
        assert_eq!(
            display.refresh(&mut slots, &mut || {}, 16, 1000),
            Err(DisplayError::BelowMinimumFrameRate {
                elapsed_ms: 2000,
                max_ms: 1000
            })
        );
        assert_eq!(display.framebuffer().swaps, 1);
    }

    #[test]
    fn test_manual_refresh_waits_for_frame_boundary() {
        let clock = MockClock::new(1000);
        let mut display = display(&clock, false);
        let (mut slots, _) = slots_with_scene();
        display.refresh(&mut slots, &mut || {}, 16, 1000).unwrap();

        // 20 ms after the last refresh; the next boundary is 12 ms away
        clock.set(1020);
        clock.step.set(1);
        let mut waits = 0;
        assert!(display
            .refresh(&mut slots, &mut || waits += 1, 16, 1000)
            .unwrap());
        assert!(waits >= 1);
        assert!(display.core.last_refresh_ms() >= 1032);
        assert_eq!(display.framebuffer().swaps, 2);
    }

    #[test]
    fn test_background_auto_refresh_when_due() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, true);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));

        assert!(!display.background(&mut slots, &mut || {}).unwrap());

        clock.set(17);
        assert!(display.background(&mut slots, &mut || {}).unwrap());
        assert_eq!(display.framebuffer().swaps, 1);

        clock.set(20);
        assert!(!display.background(&mut slots, &mut || {}).unwrap());
    }

    #[test]
    fn test_background_idle_in_manual_mode() {
        let clock = MockClock::new(10_000);
        let mut display = display(&clock, false);
        let (mut slots, _) = slots_with_scene();
        assert!(!display.background(&mut slots, &mut || {}).unwrap());
        assert_eq!(display.framebuffer().swaps, 0);
    }

    #[test]
    fn test_swap_failure_reported() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, _) = slots_with_scene();
        display.framebuffer_mut().fail_swap = true;
        assert_eq!(
            display.refresh(&mut slots, &mut || {}, 0, 1000),
            Err(DisplayError::Framebuffer(()))
        );
    }

    #[test]
    fn test_set_rotation_restarts_terminal() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));

        display.set_rotation(&mut slots, Rotation::Deg90);
        assert_eq!((display.width(), display.height()), (135, 240));
        assert_eq!(display.rotation(), Rotation::Deg90);
        assert_eq!(display.terminal.stops, 1);
        assert_eq!(display.terminal.starts, vec![(240, 135), (135, 240)]);
        assert!(slots.get(root).unwrap().transform.transpose_xy);
    }

    #[test]
    fn test_brightness_passthrough() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        assert_eq!(display.brightness(), None);
        assert!(!display.set_brightness(0.5));
        assert!(display.auto_brightness());
        assert!(!display.set_auto_brightness(false));

        display.framebuffer_mut().brightness = Some(1.0);
        assert!(display.set_brightness(0.25));
        assert_eq!(display.brightness(), Some(0.25));
    }

    #[test]
    fn test_release_and_reset() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));

        display.reset(&mut slots);
        assert!(display.auto_refresh());
        assert_eq!(display.root(), None);
        assert!(!slots.is_attached(root));

        display.show(&mut slots, Some(root));
        display.release(&mut slots);
        assert!(!slots.is_attached(root));
        assert!(display.framebuffer().deinit);
    }

    #[test]
    fn test_showing_nothing_blanks_framebuffer() {
        let clock = MockClock::new(0);
        let mut display = display(&clock, false);
        let (mut slots, root) = slots_with_scene();
        display.show(&mut slots, Some(root));
        display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap();
        assert_eq!(u32::from(display.framebuffer().pixel(17, 99)), CoordScene::color(17, 99));

        assert!(display.show(&mut slots, None));
        clock.set(10);
        assert!(display.refresh(&mut slots, &mut || {}, 0, 1000).unwrap());

        let fb = display.framebuffer();
        assert_eq!(fb.swaps, 2);
        assert!(fb.pixels.iter().all(|&b| b == 0));
        assert_eq!(display.last_refresh_stats().pixels, 240 * 135);
    }
}

//! Display task
//!
//! Owns the display and the scene. Every tick the scene advances one frame
//! and the display either refreshes itself (auto refresh) or is refreshed
//! explicitly under the configured pacing.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use fbio_core::config::PacingConfig;
use fbio_core::SceneSlots;
use fbio_display::{DisplayError, FramebufferDisplay, NoTerminal};
use fbio_hal_rp2040::EmbassyClock;

use crate::panel::St7789Panel;
use crate::scene::BouncingSquare;

pub type PanelDisplay = FramebufferDisplay<St7789Panel, EmbassyClock, NoTerminal>;

/// Scene tick interval
const TICK_INTERVAL_MS: u64 = 10;

/// Refresh chunks between status LED toggles
const CHUNKS_PER_BLINK: u32 = 256;

#[embassy_executor::task]
pub async fn display_task(mut display: PanelDisplay, pacing: PacingConfig, mut led: Output<'static>) {
    info!("Display task started");

    let mut slots: SceneSlots<BouncingSquare, 1> = SceneSlots::new();
    let Ok(root) = slots.insert(BouncingSquare::new(display.width(), display.height())) else {
        error!("No room for the scene");
        return;
    };
    display.show(&mut slots, Some(root));

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut chunks: u32 = 0;

    loop {
        ticker.next().await;

        if let Some(square) = slots.get_mut(root) {
            square.step();
        }

        // Runs between refresh chunks
        let mut heartbeat = || {
            chunks = chunks.wrapping_add(1);
            if chunks % CHUNKS_PER_BLINK == 0 {
                led.toggle();
            }
        };

        let result = if display.auto_refresh() {
            display.background(&mut slots, &mut heartbeat)
        } else {
            display.refresh(
                &mut slots,
                &mut heartbeat,
                pacing.target_ms_per_frame(),
                pacing.max_ms_per_real_frame(),
            )
        };

        match result {
            Ok(refreshed) => {
                if refreshed {
                    trace!("frame {}", display.last_refresh_stats());
                }
            }
            Err(DisplayError::BelowMinimumFrameRate { elapsed_ms, max_ms }) => {
                error!(
                    "Display fell below minimum frame rate ({} ms > {} ms), back to auto refresh",
                    elapsed_ms, max_ms
                );
                display.reset(&mut slots);
                display.show(&mut slots, Some(root));
            }
            Err(DisplayError::Framebuffer(e)) => {
                warn!("Panel write failed: {}", e);
            }
        }
    }
}

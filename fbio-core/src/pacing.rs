//! Frame pacing
//!
//! In auto mode the display refreshes itself from its background tick at the
//! panel's native rate. In manual mode the application calls `refresh` and the
//! pacer throttles those calls to a target frame time, failing hard if real
//! refreshes fall further apart than the allowed maximum.

use crate::error::ConfigError;

/// Pacing state, derived from the pacer flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacingState {
    /// Manual mode, at least one refresh done
    ManualIdle,
    /// Manual mode, next refresh goes through unconditionally
    ManualDue,
    /// Refreshes driven by the background tick
    AutoIdle,
}

/// What a refresh request should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacingDecision {
    /// Refresh now
    Refresh,
    /// Called too soon; leave the device alone
    Skip,
    /// Wait until the given time (ms), then refresh
    WaitUntil(u64),
}

/// Real refreshes fell further apart than allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeadlineMissed {
    pub elapsed_ms: u64,
    pub max_ms: u32,
}

/// Frame pacing state machine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramePacer {
    auto_refresh: bool,
    first_manual_refresh: bool,
    last_refresh_call_ms: u64,
    native_ms_per_frame: u32,
}

impl FramePacer {
    /// Create a pacer for a panel running at `native_fps`
    pub fn new(auto_refresh: bool, native_fps: u16) -> Result<Self, ConfigError> {
        if native_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(Self {
            auto_refresh,
            first_manual_refresh: !auto_refresh,
            last_refresh_call_ms: 0,
            native_ms_per_frame: 1000 / u32::from(native_fps),
        })
    }

    pub fn state(&self) -> PacingState {
        match (self.auto_refresh, self.first_manual_refresh) {
            (true, _) => PacingState::AutoIdle,
            (false, true) => PacingState::ManualDue,
            (false, false) => PacingState::ManualIdle,
        }
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// Switch between auto and manual refresh
    ///
    /// Entering manual mode makes the next manual refresh unconditional.
    pub fn set_auto_refresh(&mut self, auto_refresh: bool) {
        self.first_manual_refresh = !auto_refresh;
        self.auto_refresh = auto_refresh;
    }

    pub fn native_ms_per_frame(&self) -> u32 {
        self.native_ms_per_frame
    }

    pub fn first_manual_refresh(&self) -> bool {
        self.first_manual_refresh
    }

    /// Time of the last manual refresh call that was not rejected
    pub fn last_refresh_call_ms(&self) -> u64 {
        self.last_refresh_call_ms
    }

    /// Decide what a refresh call at `now_ms` should do
    ///
    /// `last_refresh_ms` is when the last real refresh finished. A target of
    /// zero disables throttling.
    pub fn decide(
        &mut self,
        now_ms: u64,
        last_refresh_ms: u64,
        target_ms_per_frame: u32,
        max_ms_per_real_frame: u32,
    ) -> Result<PacingDecision, DeadlineMissed> {
        if self.auto_refresh {
            self.last_refresh_call_ms = now_ms;
            return Ok(PacingDecision::Refresh);
        }

        if self.first_manual_refresh {
            self.first_manual_refresh = false;
            self.last_refresh_call_ms = now_ms;
            return Ok(PacingDecision::Refresh);
        }

        let since_real = now_ms.saturating_sub(last_refresh_ms);
        if since_real > u64::from(max_ms_per_real_frame) {
            return Err(DeadlineMissed {
                elapsed_ms: since_real,
                max_ms: max_ms_per_real_frame,
            });
        }

        let since_call = now_ms.saturating_sub(self.last_refresh_call_ms);
        self.last_refresh_call_ms = now_ms;

        let target = u64::from(target_ms_per_frame);
        if target == 0 {
            return Ok(PacingDecision::Refresh);
        }
        if since_call < target {
            return Ok(PacingDecision::Skip);
        }

        Ok(PacingDecision::WaitUntil(now_ms + (target - since_real % target)))
    }

    /// True when the background tick should refresh an auto-refreshing
    /// display
    pub fn auto_refresh_due(&self, now_ms: u64, last_refresh_ms: u64) -> bool {
        self.auto_refresh
            && now_ms.saturating_sub(last_refresh_ms) > u64::from(self.native_ms_per_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn manual() -> FramePacer {
        FramePacer::new(false, 60).unwrap()
    }

    #[test]
    fn test_zero_fps_rejected() {
        assert_eq!(
            FramePacer::new(true, 0).unwrap_err(),
            ConfigError::ZeroFrameRate
        );
        assert_eq!(FramePacer::new(true, 60).unwrap().native_ms_per_frame(), 16);
    }

    #[test]
    fn test_states_follow_flags() {
        let mut pacer = FramePacer::new(true, 60).unwrap();
        assert_eq!(pacer.state(), PacingState::AutoIdle);

        pacer.set_auto_refresh(false);
        assert_eq!(pacer.state(), PacingState::ManualDue);

        pacer.decide(100, 0, 16, 1000).unwrap();
        assert_eq!(pacer.state(), PacingState::ManualIdle);

        pacer.set_auto_refresh(true);
        assert!(!pacer.first_manual_refresh());
        assert_eq!(pacer.state(), PacingState::AutoIdle);
    }

    #[test]
    fn test_first_manual_refresh_is_unconditional() {
        let mut pacer = manual();
        // Way past the deadline, still refreshes
        assert_eq!(pacer.decide(50_000, 0, 16, 100), Ok(PacingDecision::Refresh));
        assert_eq!(pacer.last_refresh_call_ms(), 50_000);
        assert!(!pacer.first_manual_refresh());
    }

    #[test]
    fn test_call_too_soon_skips() {
        let mut pacer = manual();
        pacer.decide(1000, 0, 16, 1000).unwrap();
        assert_eq!(pacer.decide(1005, 1000, 16, 1000), Ok(PacingDecision::Skip));
        // The skipped call still counts as the last call
        assert_eq!(pacer.last_refresh_call_ms(), 1005);
    }

    #[test]
    fn test_deadline_missed() {
        let mut pacer = manual();
        pacer.decide(1000, 0, 16, 1000).unwrap();
        assert_eq!(
            pacer.decide(2500, 1000, 16, 1000),
            Err(DeadlineMissed {
                elapsed_ms: 1500,
                max_ms: 1000
            })
        );
        // Rejected call does not move the call time
        assert_eq!(pacer.last_refresh_call_ms(), 1000);
    }

    #[test]
    fn test_wait_until_next_boundary() {
        let mut pacer = manual();
        pacer.decide(1000, 0, 16, 1000).unwrap();
        // 20 ms since the call and 20 ms since the refresh: 4 ms past a
        // frame boundary, so wait for the next one
        assert_eq!(
            pacer.decide(1020, 1000, 16, 1000),
            Ok(PacingDecision::WaitUntil(1032))
        );
    }

    #[test]
    fn test_zero_target_refreshes_immediately() {
        let mut pacer = manual();
        pacer.decide(1000, 0, 0, 1000).unwrap();
        assert_eq!(pacer.decide(1001, 1000, 0, 1000), Ok(PacingDecision::Refresh));
    }

    #[test]
    fn test_auto_mode_always_refreshes() {
        let mut pacer = FramePacer::new(true, 60).unwrap();
        assert_eq!(pacer.decide(10, 9, 1000, 1), Ok(PacingDecision::Refresh));
    }

    #[test]
    fn test_auto_refresh_due() {
        let mut pacer = FramePacer::new(true, 60).unwrap();
        assert!(!pacer.auto_refresh_due(116, 100));
        assert!(pacer.auto_refresh_due(117, 100));

        pacer.set_auto_refresh(false);
        assert!(!pacer.auto_refresh_due(10_000, 0));
    }

    proptest! {
        #[test]
        fn prop_wait_lands_within_one_frame(
            last_refresh in 0u64..1_000_000,
            since_real in 0u64..500,
            target in 1u32..100,
        ) {
            let mut pacer = manual();
            pacer.decide(last_refresh, 0, target, 500).unwrap();

            let now = last_refresh + since_real;
            match pacer.decide(now, last_refresh, target, 500).unwrap() {
                PacingDecision::WaitUntil(at) => {
                    prop_assert!(at > now);
                    prop_assert!(at <= now + u64::from(target));
                    prop_assert_eq!((at - last_refresh) % u64::from(target), 0);
                }
                PacingDecision::Skip => prop_assert!(since_real < u64::from(target)),
                PacingDecision::Refresh => prop_assert!(false, "manual pacer refreshed"),
            }
        }
    }
}

//! Time source and cooperative scheduling hooks

/// Monotonic millisecond clock
pub trait Monotonic {
    /// Milliseconds since an arbitrary fixed epoch (usually boot)
    fn now_ms(&self) -> u64;
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Cooperative background work
///
/// Long-running loops call [`Background::run`] at safe points so that
/// housekeeping (USB, serial, LEDs) keeps being serviced. There is no
/// preemption: whatever runs here must return promptly.
pub trait Background {
    /// Run pending background work once
    fn run(&mut self);
}

impl<F: FnMut()> Background for F {
    fn run(&mut self) {
        self()
    }
}

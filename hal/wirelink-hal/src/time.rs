//! Time and scheduling hooks
//!
//! The transfer engine needs a monotonic millisecond clock to bound its
//! polling loops, and a place to hand control back to other cooperative
//! tasks between polls. Both are injected so a host test can substitute
//! a simulated clock and a no-op yield.

/// Monotonic millisecond clock
///
/// The value wraps; callers compare instants with `wrapping_sub`.
pub trait Clock {
    /// Get current timestamp in milliseconds
    fn now_ms(&self) -> u32;

    /// Milliseconds elapsed since `start`
    fn elapsed_ms(&self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        T::now_ms(self)
    }
}

/// Cooperative yield point
///
/// Called once per iteration of a polling loop. Firmware typically
/// feeds a watchdog or services background timers here. This is not a
/// sleep.
pub trait YieldPoint {
    /// Let other cooperative work run
    fn yield_now(&mut self);
}

/// Yield point that does nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoYield;

impl YieldPoint for NoYield {
    fn yield_now(&mut self) {}
}

impl<F: FnMut()> YieldPoint for F {
    fn yield_now(&mut self) {
        self()
    }
}

//! Millisecond timebase driven by the SysTick exception, and polled timeout timers.
//!
//! The tick counter is written only from the SysTick handler and read from anywhere.
//! Elapsed time is always computed with wrapping subtraction on `u32`, so a counter
//! wraparound between arming and polling is harmless as long as the real interval
//! stays below 2^32 ms (about 49.7 days).
//!
//! Two boundary policies coexist on purpose and must not be unified:
//! - [`TimeoutTimer`] expires once `elapsed > period`.
//! - [`delay_ms`] keeps spinning while `elapsed <= duration`, so it returns one tick
//!   later than a one-shot timer armed with the same duration would first report expiry,
//!   and `delay_ms(0)` waits for the next tick.

use core::sync::atomic::{AtomicU32, Ordering};

use fugit::{MillisDurationU32, TimerDurationU32, TimerInstantU32};

/// Rate of the tick interrupt.
pub const TICK_HZ: u32 = 1_000;

// Counter shared between the SysTick handler and the rest of the firmware.
static SYSTEM_TICKS: TickCounter = TickCounter::new();

/// Counts milliseconds since reset.
///
/// Backed by an [`AtomicU32`]; a 32 bit load is a single instruction on the Cortex-M3, and the
/// `Release`/`Acquire` pair makes the ordering between handler and readers explicit instead of
/// relying on it.
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// A counter that has already been running for `ms` milliseconds.
    pub const fn starting_at(ms: u32) -> Self {
        Self {
            ticks: AtomicU32::new(ms),
        }
    }

    /// Set the counter back to its power-on value.
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Release);
    }

    /// Advance the counter by one tick, wrapping to 0 after `u32::MAX`.
    ///
    /// Must only be called from a single context (the tick interrupt): the read-modify-write
    /// is not atomic, it is a plain load and store so it stays branch free.
    #[inline]
    pub fn on_tick(&self) {
        let ticks = self.ticks.load(Ordering::Relaxed);
        self.ticks.store(ticks.wrapping_add(1), Ordering::Release);
    }

    #[inline]
    pub fn now_ms(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Milliseconds since `reference`, modulo 2^32.
    #[inline]
    pub fn elapsed_since(&self, reference: u32) -> u32 {
        self.now_ms().wrapping_sub(reference)
    }

    /// Spin until more than `duration` milliseconds have passed.
    ///
    /// Never yields; nothing else runs in this context while waiting.
    pub fn delay_ms(&self, duration: u32) {
        let start = self.now_ms();

        while self.elapsed_since(start) <= duration {
            core::hint::spin_loop();
        }
    }

    /// The current tick count as a [`fugit`] instant.
    pub fn now(&self) -> TimerInstantU32<TICK_HZ> {
        TimerInstantU32::from_ticks(self.now_ms())
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// The counter advanced by the SysTick handler.
pub fn system_ticks() -> &'static TickCounter {
    &SYSTEM_TICKS
}

/// Call this from the SysTick exception handler, once per millisecond.
#[inline]
pub fn on_tick() {
    SYSTEM_TICKS.on_tick();
}

/// Milliseconds since reset.
#[inline]
pub fn now_ms() -> u32 {
    SYSTEM_TICKS.now_ms()
}

/// Busy wait for more than `duration` milliseconds, see [`TickCounter::delay_ms`].
pub fn delay_ms(duration: u32) {
    SYSTEM_TICKS.delay_ms(duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Once expired, every poll reports expiry until the timer is started again.
    OneShot,
    /// The poll that detects expiry re-arms the timer at the time it sampled.
    Periodic,
}

/// A period and the tick it is measured from.
///
/// The timer holds no reference to the timebase; callers poll it against whatever counter
/// they use. Expiry is recomputed on every poll, there is no stored expired flag, and a timer
/// that was not polled for several periods reports a single expiry per poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutTimer {
    period_ms: u32,
    reference_ms: u32,
    mode: TimerMode,
}

impl TimeoutTimer {
    /// A timer with its reference at tick 0. Call [`start`](Self::start) before polling.
    pub const fn new(period_ms: u32, mode: TimerMode) -> Self {
        Self {
            period_ms,
            reference_ms: 0,
            mode,
        }
    }

    pub const fn one_shot(period_ms: u32) -> Self {
        Self::new(period_ms, TimerMode::OneShot)
    }

    pub const fn periodic(period_ms: u32) -> Self {
        Self::new(period_ms, TimerMode::Periodic)
    }

    /// Arm the timer with `period_ms` from the system tick counter.
    ///
    /// A period of 0 is accepted; the timer then expires on the first poll after the next tick.
    pub fn start(&mut self, period_ms: u32) {
        self.start_at(period_ms, now_ms());
    }

    pub fn start_at(&mut self, period_ms: u32, now: u32) {
        self.period_ms = period_ms;
        self.reference_ms = now;
    }

    /// Arm again with the stored period.
    pub fn restart(&mut self) {
        self.restart_at(now_ms());
    }

    pub fn restart_at(&mut self, now: u32) {
        self.reference_ms = now;
    }

    /// Poll against the system tick counter.
    pub fn poll(&mut self) -> bool {
        self.poll_at(now_ms())
    }

    /// Poll with a tick value sampled by the caller.
    ///
    /// In periodic mode the reference moves to `now` when this returns true, so lateness in
    /// polling accumulates instead of being absorbed.
    pub fn poll_at(&mut self, now: u32) -> bool {
        let expired = self.is_expired_at(now);

        if expired && self.mode == TimerMode::Periodic {
            self.reference_ms = now;
        }

        expired
    }

    /// Whether the period has been exceeded at `now`, without re-arming.
    pub fn is_expired_at(&self, now: u32) -> bool {
        now.wrapping_sub(self.reference_ms) > self.period_ms
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn reference_ms(&self) -> u32 {
        self.reference_ms
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }
}

/// A [`TimeoutTimer`] bound to a tick counter, usable through [`fugit_timer::Timer`].
pub struct SysTickTimer<'a> {
    ticks: &'a TickCounter,
    timer: TimeoutTimer,
    armed: bool,
}

impl<'a> SysTickTimer<'a> {
    pub fn new(ticks: &'a TickCounter, mode: TimerMode) -> Self {
        Self {
            ticks,
            timer: TimeoutTimer::new(0, mode),
            armed: false,
        }
    }

    pub fn timer(&self) -> &TimeoutTimer {
        &self.timer
    }
}

impl fugit_timer::Timer<TICK_HZ> for SysTickTimer<'_> {
    type Error = core::convert::Infallible;

    fn now(&mut self) -> TimerInstantU32<TICK_HZ> {
        self.ticks.now()
    }

    fn start(&mut self, duration: TimerDurationU32<TICK_HZ>) -> Result<(), Self::Error> {
        self.timer.start_at(duration.ticks(), self.ticks.now_ms());
        self.armed = true;
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        self.armed = false;
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        if self.armed && self.timer.poll_at(self.ticks.now_ms()) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

/// Blocking delay provider on top of a tick counter.
///
/// Sub-millisecond requests are rounded up to whole ticks and then waited for with
/// [`TickCounter::delay_ms`], so the resolution is one millisecond.
pub struct SysTickDelay<'a> {
    ticks: &'a TickCounter,
}

impl<'a> SysTickDelay<'a> {
    pub fn new(ticks: &'a TickCounter) -> Self {
        Self { ticks }
    }
}

impl fugit_timer::Delay<TICK_HZ> for SysTickDelay<'_> {
    type Error = core::convert::Infallible;

    fn delay(&mut self, duration: MillisDurationU32) -> Result<(), Self::Error> {
        self.ticks.delay_ms(duration.ticks());
        Ok(())
    }
}

impl embedded_hal::delay::DelayNs for SysTickDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.ticks.delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.ticks.delay_ms(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ticks.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_advances_once_per_tick() {
        for (start, ticks) in [(0u32, 0u32), (0, 1), (17, 1_000), (u32::MAX - 3, 10)] {
            let counter = TickCounter::starting_at(start);
            for _ in 0..ticks {
                counter.on_tick();
            }
            assert_eq!(counter.now_ms(), start.wrapping_add(ticks), "start {start}, {ticks} ticks");
        }
    }

    #[test]
    fn counter_wraps_to_zero() {
        let counter = TickCounter::starting_at(u32::MAX);
        counter.on_tick();
        assert_eq!(counter.now_ms(), 0);
    }

    #[test]
    fn reset_returns_to_zero() {
        let counter = TickCounter::starting_at(1234);
        counter.reset();
        assert_eq!(counter.now_ms(), 0);
    }

    #[test]
    fn one_shot_expires_strictly_after_period() {
        let mut timer = TimeoutTimer::one_shot(100);
        timer.start_at(100, 0);

        for now in 0..=100 {
            assert!(!timer.poll_at(now), "expired early at {now}");
        }
        assert!(timer.poll_at(101));
        assert!(timer.poll_at(101));
        assert!(timer.poll_at(5_000));
        assert_eq!(timer.reference_ms(), 0);
    }

    #[test]
    fn periodic_rearms_at_detection_tick() {
        let mut timer = TimeoutTimer::periodic(100);
        timer.start_at(100, 0);

        assert!(timer.poll_at(101));
        assert_eq!(timer.reference_ms(), 101);
        assert!(!timer.poll_at(201));
        assert!(timer.poll_at(202));
        assert_eq!(timer.reference_ms(), 202);
    }

    #[test]
    fn periodic_late_poll_reports_single_expiry() {
        let mut timer = TimeoutTimer::periodic(10);
        timer.start_at(10, 0);

        assert!(timer.poll_at(1_000));
        assert!(!timer.poll_at(1_000));
        assert!(!timer.poll_at(1_010));
        assert!(timer.poll_at(1_011));
    }

    #[test]
    fn expiry_survives_counter_wrap() {
        let counter = TickCounter::starting_at(u32::MAX);
        let mut timer = TimeoutTimer::one_shot(40);
        timer.start_at(40, u32::MAX - 49);

        assert!(!timer.is_expired_at(u32::MAX - 9));
        assert!(timer.is_expired_at(u32::MAX - 8));

        counter.on_tick();
        assert_eq!(counter.now_ms(), 0);
        assert!(timer.poll_at(counter.now_ms()));
    }

    #[test]
    fn polling_before_expiry_leaves_reference_alone() {
        for mode in [TimerMode::OneShot, TimerMode::Periodic] {
            let mut timer = TimeoutTimer::new(50, mode);
            timer.start_at(50, 7);
            for _ in 0..10 {
                assert!(!timer.poll_at(30));
            }
            assert_eq!(timer.reference_ms(), 7);
        }
    }

    #[test]
    fn zero_period_expires_after_next_tick() {
        let mut timer = TimeoutTimer::one_shot(0);
        timer.start_at(0, 500);
        assert!(!timer.poll_at(500));
        assert!(timer.poll_at(501));
    }

    #[test]
    fn restart_keeps_period() {
        let mut timer = TimeoutTimer::one_shot(20);
        timer.start_at(20, 0);
        assert!(timer.poll_at(21));

        timer.restart_at(21);
        assert_eq!(timer.period_ms(), 20);
        assert!(!timer.poll_at(41));
        assert!(timer.poll_at(42));
    }
}

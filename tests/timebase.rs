//! Timebase behaviour as seen from an application: the tick handler runs on one thread,
//! busy-waiting code on another.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use fugit::{ExtU32, TimerInstantU32};
use fugit_timer::{Delay, Timer};
use stm32f103_psp::timebase::{
    self, SysTickDelay, SysTickTimer, TickCounter, TimeoutTimer, TimerMode,
};

/// Upper bound on ticks fed to a waiting thread before the test gives up.
const MAX_TICKS: u32 = 10_000;

/// Run `wait` on its own thread while this thread plays the SysTick handler.
///
/// `before` ticks are issued first, after which `wait` must still be blocked. Then ticks keep
/// coming until it returns. Returns the counter value at that point.
fn tick_until_done(counter: &TickCounter, before: u32, wait: impl FnOnce() + Send) -> u32 {
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            wait();
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..before {
            thread::sleep(Duration::from_millis(1));
            counter.on_tick();
        }
        thread::sleep(Duration::from_millis(20));
        assert!(!done.load(Ordering::SeqCst), "returned after only {before} ticks");

        let mut ticks = 0;
        while !done.load(Ordering::SeqCst) {
            assert!(ticks < MAX_TICKS, "never returned");
            counter.on_tick();
            ticks += 1;
            thread::sleep(Duration::from_millis(1));
        }
    });

    counter.now_ms()
}

#[test]
fn system_counter_drives_free_functions_and_timers() {
    // The only test touching the process-wide counter.
    let start = timebase::now_ms();
    assert_eq!(timebase::system_ticks().now_ms(), start);

    let mut one_shot = TimeoutTimer::one_shot(3);
    one_shot.start(3);
    let mut periodic = TimeoutTimer::periodic(3);
    periodic.start(3);

    for _ in 0..3 {
        timebase::on_tick();
        assert!(!one_shot.poll());
        assert!(!periodic.poll());
    }
    assert_eq!(timebase::now_ms(), start.wrapping_add(3));

    timebase::on_tick();
    assert!(one_shot.poll());
    assert!(periodic.poll());
    assert_eq!(periodic.reference_ms(), start.wrapping_add(4));
    assert!(one_shot.poll());
    assert!(!periodic.poll());

    one_shot.restart();
    assert!(!one_shot.poll());
    assert_eq!(one_shot.reference_ms(), timebase::now_ms());
}

#[test]
fn delay_waits_one_tick_past_duration() {
    let counter = TickCounter::new();

    let now = tick_until_done(&counter, 5, || counter.delay_ms(5));

    assert!(now >= 6, "returned at {now}");
}

#[test]
fn zero_delay_waits_for_next_tick() {
    let counter = TickCounter::starting_at(41);

    let now = tick_until_done(&counter, 0, || counter.delay_ms(0));

    assert!(now >= 42, "returned at {now}");
}

#[test]
fn delay_across_counter_wrap() {
    let counter = TickCounter::starting_at(u32::MAX - 2);

    let now = tick_until_done(&counter, 4, || counter.delay_ms(4));

    // Five ticks from u32::MAX - 2 land on 2
    assert!(now >= 2 && now < u32::MAX - 2, "returned at {now}");
}

#[test]
fn delay_providers_round_up_to_whole_ticks() {
    let counter = TickCounter::new();

    let now = tick_until_done(&counter, 1, || {
        let mut delay = SysTickDelay::new(&counter);
        // 1 ns still means one full tick, plus the boundary tick
        delay.delay_ns(1);
    });
    assert!(now >= 2, "delay_ns returned at {now}");

    let counter = TickCounter::new();
    let now = tick_until_done(&counter, 2, || {
        let mut delay = SysTickDelay::new(&counter);
        delay.delay_us(1_500);
    });
    assert!(now >= 3, "delay_us returned at {now}");

    let counter = TickCounter::new();
    let now = tick_until_done(&counter, 3, || {
        let mut delay = SysTickDelay::new(&counter);
        Delay::delay(&mut delay, 3.millis()).unwrap();
    });
    assert!(now >= 4, "Delay::delay returned at {now}");
}

#[test]
fn fugit_timer_periodic_wait() {
    let ticks = TickCounter::starting_at(1_000);
    let mut timer = SysTickTimer::new(&ticks, TimerMode::Periodic);

    // Not started yet
    assert!(timer.wait().is_err());

    timer.start(5.millis()).unwrap();
    assert_eq!(timer.now(), TimerInstantU32::from_ticks(1_000));

    for _ in 0..5 {
        ticks.on_tick();
        assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));
    }
    ticks.on_tick();
    assert_eq!(timer.wait(), Ok(()));
    assert_eq!(timer.timer().reference_ms(), 1_006);

    // Re-armed on detection
    assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));
    for _ in 0..6 {
        ticks.on_tick();
    }
    assert_eq!(timer.wait(), Ok(()));
}

#[test]
fn fugit_timer_one_shot_and_cancel() {
    let ticks = TickCounter::new();
    let mut timer = SysTickTimer::new(&ticks, TimerMode::OneShot);

    timer.start(2.millis()).unwrap();
    for _ in 0..3 {
        ticks.on_tick();
    }
    assert_eq!(timer.wait(), Ok(()));
    assert_eq!(timer.wait(), Ok(()));

    timer.cancel().unwrap();
    ticks.on_tick();
    assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));

    timer.start(0.millis()).unwrap();
    assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));
    ticks.on_tick();
    assert_eq!(timer.wait(), Ok(()));
}

#[test]
fn timers_tolerate_wraparound_between_start_and_poll() {
    let ticks = TickCounter::starting_at(u32::MAX - 49);
    let mut timer = TimeoutTimer::one_shot(40);
    timer.start_at(40, ticks.now_ms());

    for _ in 0..40 {
        ticks.on_tick();
        assert!(!timer.poll_at(ticks.now_ms()));
    }
    ticks.on_tick();
    assert!(timer.poll_at(ticks.now_ms()));

    // A long way past the wrap it stays expired
    for _ in 0..60 {
        ticks.on_tick();
    }
    assert_eq!(ticks.now_ms(), 51);
    assert!(timer.poll_at(ticks.now_ms()));
}

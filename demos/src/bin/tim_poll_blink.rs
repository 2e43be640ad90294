//! Toggle the LED on every TIM2 update event, polled from the main loop at 1 Hz.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use fugit::RateExtU32;
use panic_rtt_target as _;

use stm32f103_psp::hardware::{self, systick, Timer};
use stm32f103_psp::rtt_logger;

/// TIM2 counts at 10 kHz (PSC 3199 from 32 MHz).
const COUNT_HZ: u32 = 10_000;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();
    let tim2 = stm32ral::tim2::TIM2::take().unwrap();

    let mut hw = hardware::board_init(rcc, cp.SYST);

    let mut timer: Timer<COUNT_HZ> = Timer::new(tim2, &hw.clocks);
    // ARR 9999: one update per second
    timer.start_rate(1.Hz()).unwrap();

    loop {
        nb::block!(timer.wait()).unwrap();
        hw.led.toggle();
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

//! Board bring-up, then toggle the LED every second from a periodic timeout timer.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_rtt_target as _;

use stm32f103_psp::hardware::{self, systick};
use stm32f103_psp::rtt_logger;
use stm32f103_psp::timebase::TimeoutTimer;

const LED_BLINK_TIME_MS: u32 = 1_000;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();

    let mut hw = hardware::board_init(rcc, cp.SYST);

    let mut blink_timer = TimeoutTimer::periodic(LED_BLINK_TIME_MS);
    blink_timer.start(LED_BLINK_TIME_MS);

    let mut blinks = 0u32;

    loop {
        if blink_timer.poll() {
            hw.led.toggle();
            blinks += 1;
            log::info!("BLINK {blinks}");
        }
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

//! Fast blink using only the clock tree, SysTick and one pin, without the board helper.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_rtt_target as _;

use stm32f103_psp::config::{OutputType, PinMode, Speed};
use stm32f103_psp::hardware::{
    gpio::{Pin, PinN, Port},
    rcc::Rcc,
    systick,
};
use stm32f103_psp::rtt_logger;
use stm32f103_psp::timebase::TimeoutTimer;

const LED_BLINK_TIME_MS: u32 = 100;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Debug);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();

    let clocks = Rcc::new(rcc).setup();
    let _systick = systick::SysTick::start(cp.SYST, &clocks);

    let mut led = Pin::new(
        Port::A,
        PinN::P5,
        PinMode::Output(OutputType::PushPull, Speed::Max10MHz),
    );
    // Light up right away
    led.set_high();

    let mut blink_timer = TimeoutTimer::periodic(LED_BLINK_TIME_MS);
    blink_timer.start(LED_BLINK_TIME_MS);

    loop {
        if blink_timer.poll() {
            led.toggle();
        }
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

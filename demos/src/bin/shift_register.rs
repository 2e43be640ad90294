//! Count 0 to 9 on a seven segment display behind an SN74HC595, one digit every 500 ms.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_rtt_target as _;

use stm32f103_psp::bsp::Sn74hc595;
use stm32f103_psp::config::{OutputType, PinMode, Speed};
use stm32f103_psp::hardware::{self, systick, Pin, PinN, Port};
use stm32f103_psp::rtt_logger;
use stm32f103_psp::timebase::TimeoutTimer;

const UPDATE_TIME_MS: u32 = 500;

const OUTPUT: PinMode = PinMode::Output(OutputType::PushPull, Speed::Max10MHz);

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();

    let _hw = hardware::board_init(rcc, cp.SYST);

    let data = Pin::new(Port::C, PinN::P8, OUTPUT);
    let clock = Pin::new(Port::C, PinN::P6, OUTPUT);
    let latch = Pin::new(Port::C, PinN::P5, OUTPUT);

    let mut display = match Sn74hc595::new(data, clock, latch) {
        Ok(display) => display,
        Err(e) => match e {},
    };

    let mut update_timer = TimeoutTimer::periodic(UPDATE_TIME_MS);
    update_timer.start(UPDATE_TIME_MS);

    let mut value = 0usize;

    loop {
        if update_timer.poll() {
            // Pins are infallible
            display.write_digit(value).ok();
            value = value.wrapping_add(1);
        }
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

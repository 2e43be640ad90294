//! Let TIM2 channel 2 toggle PA1 on every compare match; the main loop does nothing.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use fugit::RateExtU32;
use panic_rtt_target as _;

use stm32f103_psp::config::{OutputType, PinMode, Speed};
use stm32f103_psp::hardware::{self, systick, timer::Channel, Pin, PinN, Port, Timer};
use stm32f103_psp::rtt_logger;

const COUNT_HZ: u32 = 10_000;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();
    let tim2 = stm32ral::tim2::TIM2::take().unwrap();

    let hw = hardware::board_init(rcc, cp.SYST);

    // TIM2_CH2 is on PA1 without remapping
    let _led = Pin::new(
        Port::A,
        PinN::P1,
        PinMode::Alternate(OutputType::PushPull, Speed::Max10MHz),
    );

    let mut timer: Timer<COUNT_HZ> = Timer::new(tim2, &hw.clocks);
    timer.toggle_on_match(Channel::C2, 0);
    // ARR 999: the output flips 10 times a second
    timer.start_rate(10.Hz()).unwrap();

    loop {
        cortex_m::asm::wfi();
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

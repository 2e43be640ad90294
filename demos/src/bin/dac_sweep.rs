//! Ramp both MCP4822 outputs every 1 ms, channel B running half a ramp ahead of channel A.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_rtt_target as _;

use stm32f103_psp::bsp::{Channel, Gain, Mcp4822};
use stm32f103_psp::config::{BaudDivider, BitOrder, FrameFormat, PinMode, SpiConfig};
use stm32f103_psp::hardware::{self, systick, Pin, PinN, Port, Spi, SpiPins};
use stm32f103_psp::rtt_logger;
use stm32f103_psp::timebase::TimeoutTimer;

const UPDATE_TIME_MS: u32 = 1;

/// Increment per update. The DAC only keeps the low 12 bits, so the ramp wraps every
/// 4096 / 25 updates.
const STEP: u16 = 25;

/// Half of the 12 bit range.
const PHASE_OFFSET: u16 = 1 << 11;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();
    let spi1 = stm32ral::spi::SPI1::take().unwrap();

    let hw = hardware::board_init(rcc, cp.SYST);

    let pins = SpiPins {
        ss: Pin::new(Port::A, PinN::P4, PinMode::Floating),
        sck: Pin::new(Port::A, PinN::P5, PinMode::Floating),
        miso: Pin::new(Port::A, PinN::P6, PinMode::Floating),
        mosi: Pin::new(Port::A, PinN::P7, PinMode::Floating),
    };
    let config = SpiConfig {
        baud: BaudDivider::Div64,
        frame: FrameFormat::Bits16,
        bit_order: BitOrder::MsbFirst,
    };
    let mut dac = Mcp4822::new(Spi::new(spi1, pins, config, &hw.clocks));

    let mut update_timer = TimeoutTimer::periodic(UPDATE_TIME_MS);
    update_timer.start(UPDATE_TIME_MS);

    let mut value = 0u16;

    loop {
        if update_timer.poll() {
            // The bus is infallible
            dac.write(Channel::A, Gain::X1, value).ok();
            dac.write(Channel::B, Gain::X1, value.wrapping_add(PHASE_OFFSET)).ok();
            value = value.wrapping_add(STEP);
        }
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

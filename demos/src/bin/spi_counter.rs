//! Send an incrementing 16 bit counter, LSB first, over SPI1 every 10 ms.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_rtt_target as _;

use stm32f103_psp::config::{BaudDivider, BitOrder, FrameFormat, PinMode, SpiConfig};
use stm32f103_psp::hardware::{self, systick, Pin, PinN, Port, Spi, SpiPins};
use stm32f103_psp::rtt_logger;
use stm32f103_psp::timebase::TimeoutTimer;

const UPDATE_TIME_MS: u32 = 10;

#[entry]
fn main() -> ! {
    rtt_logger::init(log::LevelFilter::Info);

    let cp = cortex_m::Peripherals::take().unwrap();
    let rcc = stm32ral::rcc::RCC::take().unwrap();
    let spi1 = stm32ral::spi::SPI1::take().unwrap();

    // SCK shares PA5 with the LED, the SPI driver takes the pin over
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
        bit_order: BitOrder::LsbFirst,
    };
    let mut spi = Spi::new(spi1, pins, config, &hw.clocks);

    let mut update_timer = TimeoutTimer::periodic(UPDATE_TIME_MS);
    update_timer.start(UPDATE_TIME_MS);

    let mut value = 0u16;

    loop {
        if update_timer.poll() {
            spi.send_16(value);
            value = value.wrapping_add(1);
        }
    }
}

#[exception]
fn SysTick() {
    systick::SysTick::interrupt_handler();
}

//! Register level drivers and the board bring-up for the STM32F103.
//! This module hides the register details of the MCU.
//! It exposes high level APIs to control the device.
//!
//! The SysTick exception handler has to be placed in the application and should call
//! [`SysTick::interrupt_handler`]. This means the application is not fully hardware agnostic.

pub mod gpio;
pub mod rcc;
pub mod spi;
pub mod systick;
pub mod timer;

use cortex_m::peripheral::SYST;

use crate::config::{OutputType, PinMode, Speed};

pub use self::gpio::{Pin, PinN, Port};
pub use self::rcc::Clocks;
pub use self::spi::{Spi, SpiPins};
pub use self::systick::SysTick;
pub use self::timer::Timer;

/// The Board struct exposes all initialized drivers.
/// All members are public and are intended to be moved out all at the same time.
pub struct Board {
    pub clocks: Clocks,
    /// User LED on PA5.
    pub led: Pin,
    pub systick: SysTick,
}

/// This is the entry function for the hardware module.
/// The application needs to call this in order to gain access to board functionality.
///
/// # Example
///
/// ```ignore
/// let cp = cortex_m::Peripherals::take().unwrap();
/// let rcc = stm32ral::rcc::RCC::take().unwrap();
/// let mut hw = hardware::board_init(rcc, cp.SYST);
/// hw.led.toggle();
/// ```
pub fn board_init(rcc: stm32ral::rcc::Instance, syst: SYST) -> Board {
    let clocks = rcc::Rcc::new(rcc).setup();
    let sysclk = clocks.sysclk().to_MHz();
    log::info!("Sysclk: {sysclk:?} MHz");

    let systick = SysTick::start(syst, &clocks);

    let mut led = Pin::new(
        Port::A,
        PinN::P5,
        PinMode::Output(OutputType::PushPull, Speed::Max10MHz),
    );
    led.set_high();

    log::info!("Board Init Done");

    Board {
        clocks,
        led,
        systick,
    }
}

//! GPIO abstraction for configuring and controling mcu pins.
//!
//! Note that this module currently still allows creating multiple instances of the same pin.

use core::convert::Infallible;

use cortex_m::interrupt::free;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use stm32ral::{gpio, read_reg, write_reg};

use super::rcc;
use crate::config::{cr_position, PinMode, Pull};

/// Values for `GPIOx_IDR` and `GPIOx_ODR`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PinState {
    High = 1,
    Low = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinN {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
    P8,
    P9,
    P10,
    P11,
    P12,
    P13,
    P14,
    P15,
}

/// Represents a single GPIO pin. Allows configuration, and reading/setting state.
pub struct Pin {
    /// The GPIO Port letter. Eg A, B, C.
    pub port: Port,
    /// The pin number: 0 - 15.
    pub pin: PinN,
}

impl Pin {
    /// Create a new pin, with a specific mode. Enables the RCC peripheral clock to the port,
    /// if not already enabled. Example: `let pa5 = Pin::new(Port::A, PinN::P5, PinMode::Floating);`
    pub fn new(port: Port, pin: PinN, mode: PinMode) -> Self {
        free(|_| {
            // Turn on GPIO peripheral if not already enabled
            match port {
                Port::A => {
                    if !rcc::gpioa_is_enabled() {
                        rcc::enable_rst_gpioa()
                    }
                }
                Port::B => {
                    if !rcc::gpiob_is_enabled() {
                        rcc::enable_rst_gpiob()
                    }
                }
                Port::C => {
                    if !rcc::gpioc_is_enabled() {
                        rcc::enable_rst_gpioc()
                    }
                }
                Port::D => {
                    if !rcc::gpiod_is_enabled() {
                        rcc::enable_rst_gpiod()
                    }
                }
                Port::E => {
                    if !rcc::gpioe_is_enabled() {
                        rcc::enable_rst_gpioe()
                    }
                }
            }
        });

        let mut new_pin = Self { port, pin };

        new_pin.mode(mode);

        new_pin
    }

    fn mask(&self) -> u32 {
        1 << (self.pin as u32)
    }

    /// Write the CNF and MODE bits of this pin into `CRL` (pins 0..7) or `CRH` (pins 8..15),
    /// and the pull direction into `ODR` for pulled inputs.
    pub fn mode(&mut self, value: PinMode) {
        let (high, shift) = cr_position(self.pin as u8);
        let nibble = value.nibble() << shift;
        let clear = !(0xF << shift);

        free(|_| {
            let port = unsafe { instance(self.port) };

            if high {
                let cr = read_reg!(gpio, port, CRH);
                write_reg!(gpio, port, CRH, (cr & clear) | nibble);
            } else {
                let cr = read_reg!(gpio, port, CRL);
                write_reg!(gpio, port, CRL, (cr & clear) | nibble);
            }
        });

        match value.pull() {
            Some(Pull::Up) => self.set_state(PinState::High),
            Some(Pull::Down) => self.set_state(PinState::Low),
            None => {}
        }
    }

    /// Set a pin state (ie set high or low output voltage level). See also `set_high()` and
    /// `set_low()`. Sets the `BSRR` or `BRR` register. Atomic.
    pub fn set_state(&mut self, value: PinState) {
        let port = unsafe { instance(self.port) };

        match value {
            PinState::High => write_reg!(gpio, port, BSRR, self.mask()),
            PinState::Low => write_reg!(gpio, port, BRR, self.mask()),
        }
    }

    /// Read the input data register. Eg determine if the pin is high or low. See also `is_high()`
    /// and `is_low()`. Reads from the `IDR` register.
    pub fn get_state(&self) -> PinState {
        let idr = read_reg!(gpio, unsafe { instance(self.port) }, IDR);

        if (idr & self.mask()) > 0 {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Level the pin is driving, from the `ODR` register.
    pub fn get_output_state(&self) -> PinState {
        let odr = read_reg!(gpio, unsafe { instance(self.port) }, ODR);

        if (odr & self.mask()) > 0 {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Check if the pin's input voltage is high. Reads from the `IDR` register.
    pub fn is_high(&self) -> bool {
        self.get_state() == PinState::High
    }

    /// Check if the pin's input voltage is low. Reads from the `IDR` register.
    pub fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Set the pin's output voltage to high. Sets the `BSRR` register. Atomic.
    pub fn set_high(&mut self) {
        self.set_state(PinState::High);
    }

    /// Set the pin's output voltage to low. Sets the `BRR` register. Atomic.
    pub fn set_low(&mut self) {
        self.set_state(PinState::Low);
    }

    /// Invert the driven level.
    /// Note: based on `ODR`, so it also works for pins that read back differently.
    pub fn toggle(&mut self) {
        match self.get_output_state() {
            PinState::High => self.set_low(),
            PinState::Low => self.set_high(),
        }
    }
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self);
        Ok(())
    }
}

impl StatefulOutputPin for Pin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.get_output_state() == PinState::High)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.get_output_state() == PinState::Low)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self);
        Ok(())
    }
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::is_high(self))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::is_low(self))
    }
}

unsafe fn instance(port: Port) -> gpio::Instance {
    match port {
        Port::A => gpio::GPIOA::steal(),
        Port::B => gpio::GPIOB::steal(),
        Port::C => gpio::GPIOC::steal(),
        Port::D => gpio::GPIOD::steal(),
        Port::E => gpio::GPIOE::steal(),
    }
}

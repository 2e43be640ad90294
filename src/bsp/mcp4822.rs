//! MCP4822 dual 12 bit DAC with internal reference.
//!
//! Each write is a single 16 bit frame, MSB first:
//!
//! | bit | 15     | 14 | 13   | 12    | 11..0 |
//! |-----|--------|----|------|-------|-------|
//! |     | A/B    | -  | GA   | SHDN  | data  |
//!
//! The bus has to be set up for 16 bit MSB first frames; chip select is framed by the
//! [`SpiDevice`] and the output updates when it goes high (LDAC tied low).

use embedded_hal::spi::SpiDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    /// Full scale 4.096 V; clips on a 3.3 V supply.
    X2,
    /// Full scale 2.048 V.
    X1,
}

const CHANNEL_B: u16 = 1 << 15;
const GAIN_1X: u16 = 1 << 13;
const ACTIVE: u16 = 1 << 12;
const DATA_MASK: u16 = 0x0FFF;

/// Command word for a DAC write. Bits of `value` above the 12th are discarded.
pub fn command_word(channel: Channel, gain: Gain, value: u16) -> u16 {
    let mut word = ACTIVE | (value & DATA_MASK);

    if channel == Channel::B {
        word |= CHANNEL_B;
    }
    if gain == Gain::X1 {
        word |= GAIN_1X;
    }

    word
}

pub struct Mcp4822<SPI> {
    spi: SPI,
}

impl<SPI> Mcp4822<SPI>
where
    SPI: SpiDevice<u16>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn write(&mut self, channel: Channel, gain: Gain, value: u16) -> Result<(), SPI::Error> {
        self.spi.write(&[command_word(channel, gain, value)])
    }

    /// Power down one output; it goes high impedance until the next write to it.
    pub fn shutdown(&mut self, channel: Channel) -> Result<(), SPI::Error> {
        let word = command_word(channel, Gain::X1, 0) & !ACTIVE;
        self.spi.write(&[word])
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

//! SN74HC595 8 bit serial-in, parallel-out shift register, bit-banged over three pins.

use embedded_hal::digital::{OutputPin, PinState};

/// Segment patterns for 0 to 9 on the seven segment display of the quad ADSR board.
///
/// The bit to segment mapping follows the board layout, not the usual `gfedcba` order.
pub const SEVEN_SEGMENT_DIGITS: [u8; 10] = [
    0b1111_0011,
    0b0101_0000,
    0b1100_1011,
    0b1101_1001,
    0b0111_1000,
    0b1011_1001,
    0b1011_1011,
    0b1101_0000,
    0b1111_1011,
    0b1111_1001,
];

pub struct Sn74hc595<SER, SRCLK, RCLK> {
    /// Serial data input.
    ser: SER,
    /// Shift register clock, data is sampled on the rising edge.
    srclk: SRCLK,
    /// Storage register (latch) clock, outputs update on the rising edge.
    rclk: RCLK,
}

impl<SER, SRCLK, RCLK, E> Sn74hc595<SER, SRCLK, RCLK>
where
    SER: OutputPin<Error = E>,
    SRCLK: OutputPin<Error = E>,
    RCLK: OutputPin<Error = E>,
{
    /// Takes the three pins, already configured as outputs, and drives their idle levels.
    pub fn new(mut ser: SER, mut srclk: SRCLK, mut rclk: RCLK) -> Result<Self, E> {
        ser.set_low()?;
        srclk.set_low()?;
        rclk.set_high()?;

        Ok(Self { ser, srclk, rclk })
    }

    /// Shift `value` out MSB first and latch it onto the outputs.
    pub fn write(&mut self, value: u8) -> Result<(), E> {
        self.rclk.set_low()?;

        for bit in (0..8).rev() {
            self.srclk.set_low()?;
            self.ser.set_state(PinState::from((value >> bit) & 1 == 1))?;
            self.srclk.set_high()?;
        }

        self.rclk.set_high()?;
        log::trace!("74HC595 <- {value:#010b}");

        Ok(())
    }

    /// Show a decimal digit; only the last digit of `value` is used.
    pub fn write_digit(&mut self, value: usize) -> Result<(), E> {
        self.write(SEVEN_SEGMENT_DIGITS[value % SEVEN_SEGMENT_DIGITS.len()])
    }

    pub fn release(self) -> (SER, SRCLK, RCLK) {
        (self.ser, self.srclk, self.rclk)
    }
}

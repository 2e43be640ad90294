//! SPI1 in master mode with software slave select.
//!
//! `send_8`/`send_16` mirror the simple blocking transfers the demos need. The bus also
//! implements the `embedded-hal-nb` word interface and, because it owns the SS pin, the
//! `embedded-hal` `SpiDevice` interface used by the board drivers.

use core::convert::Infallible;
use core::ops::Deref;

use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
use embedded_hal_nb::spi::FullDuplex;
use stm32ral::{modify_reg, read_reg, reset_reg, spi, write_reg};

use super::{
    gpio::Pin,
    rcc::{self, Clocks},
};
use crate::config::{OutputType, PinMode, Pull, Speed, SpiConfig};
use crate::timebase;

/// Data register access for the two frame widths.
pub trait Word: Copy + Default + 'static {
    fn to_dr(self) -> u32;
    fn from_dr(dr: u32) -> Self;
}

impl Word for u8 {
    fn to_dr(self) -> u32 {
        self as u32
    }

    fn from_dr(dr: u32) -> Self {
        dr as u8
    }
}

impl Word for u16 {
    fn to_dr(self) -> u32 {
        self as u32
    }

    fn from_dr(dr: u32) -> Self {
        dr as u16
    }
}

pub struct SpiPins {
    pub sck: Pin,
    pub miso: Pin,
    pub mosi: Pin,
    /// Driven by software around every frame or transaction.
    pub ss: Pin,
}

pub struct Spi {
    spi: spi::Instance,
    pins: SpiPins,
    config: SpiConfig,
}

impl Spi {
    pub fn new(spi: spi::Instance, mut pins: SpiPins, config: SpiConfig, clocks: &Clocks) -> Self {
        if spi.deref() as *const _ != spi::SPI1 {
            panic!("SPI must be SPI1");
        }
        rcc::enable_rst_spi1();
        rcc::enable_rst_afio();

        reset_reg!(spi, spi, SPI1, CR1);

        modify_reg!(spi, spi, CR1,
            BR: config.baud.bits(),
            DFF: config.dff(),
            LSBFIRST: config.lsbfirst(),
            // Software slave management, keep the internal NSS high so we stay master
            SSM: 1,
            SSI: 1,
            MSTR: 1
        );
        modify_reg!(spi, spi, CR1, SPE: 1);

        pins.mosi.mode(PinMode::Alternate(OutputType::PushPull, Speed::Max50MHz));
        pins.miso.mode(PinMode::Pulled(Pull::Up));
        pins.sck.mode(PinMode::Alternate(OutputType::PushPull, Speed::Max50MHz));
        pins.ss.mode(PinMode::Output(OutputType::PushPull, Speed::Max50MHz));
        pins.ss.set_high();

        log::debug!("SPI1 at {} Hz", config.sck(clocks.pclk2()).raw());

        Spi { spi, pins, config }
    }

    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    fn tx_empty(&self) -> bool {
        read_reg!(spi, self.spi, SR, TXE == 1)
    }

    fn rx_not_empty(&self) -> bool {
        read_reg!(spi, self.spi, SR, RXNE == 1)
    }

    fn busy(&self) -> bool {
        read_reg!(spi, self.spi, SR, BSY == 1)
    }

    fn send_frame(&mut self, data: u32) {
        // Wait until Tx buffer is empty
        while !self.tx_empty() {}

        self.pins.ss.set_low();
        write_reg!(spi, self.spi, DR, data);

        // Wait for the transmission to complete
        while self.busy() {}
        self.pins.ss.set_high();
    }

    /// Send one frame framed by SS. The bus must be set up for 8 bit frames.
    pub fn send_8(&mut self, data: u8) {
        self.send_frame(data as u32);
    }

    /// Send one frame framed by SS. The bus must be set up for 16 bit frames.
    pub fn send_16(&mut self, data: u16) {
        self.send_frame(data as u32);
    }

    fn write_word<W: Word>(&mut self, word: W) -> nb::Result<(), Infallible> {
        if self.tx_empty() {
            write_reg!(spi, self.spi, DR, word.to_dr());
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn read_word<W: Word>(&mut self) -> nb::Result<W, Infallible> {
        if self.rx_not_empty() {
            Ok(W::from_dr(read_reg!(spi, self.spi, DR)))
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn exchange<W: Word>(&mut self, word: W) -> Result<W, Infallible> {
        nb::block!(self.write_word(word))?;
        nb::block!(self.read_word())
    }

    fn run<W: Word>(&mut self, operations: &mut [Operation<'_, W>]) -> Result<(), Infallible> {
        while !self.tx_empty() {}
        self.pins.ss.set_low();

        for operation in operations.iter_mut() {
            match operation {
                Operation::Read(words) => {
                    for word in words.iter_mut() {
                        *word = self.exchange(W::default())?;
                    }
                }
                Operation::Write(words) => {
                    for word in words.iter() {
                        self.exchange(*word)?;
                    }
                }
                Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let out = write.get(i).copied().unwrap_or_default();
                        let received = self.exchange(out)?;
                        if let Some(slot) = read.get_mut(i) {
                            *slot = received;
                        }
                    }
                }
                Operation::TransferInPlace(words) => {
                    for word in words.iter_mut() {
                        *word = self.exchange(*word)?;
                    }
                }
                Operation::DelayNs(ns) => {
                    while self.busy() {}
                    timebase::delay_ms(ns.div_ceil(1_000_000));
                }
            }
        }

        while self.busy() {}
        self.pins.ss.set_high();
        log::trace!("SPI1 transaction of {} operations", operations.len());

        Ok(())
    }

    pub fn release(self) -> (spi::Instance, SpiPins) {
        modify_reg!(spi, self.spi, CR1, SPE: 0);
        (self.spi, self.pins)
    }
}

impl ErrorType for Spi {
    type Error = Infallible;
}

impl FullDuplex<u8> for Spi {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.read_word()
    }

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.write_word(word)
    }
}

impl FullDuplex<u16> for Spi {
    fn read(&mut self) -> nb::Result<u16, Self::Error> {
        self.read_word()
    }

    fn write(&mut self, word: u16) -> nb::Result<(), Self::Error> {
        self.write_word(word)
    }
}

impl SpiDevice<u8> for Spi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

impl SpiDevice<u16> for Spi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u16>]) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

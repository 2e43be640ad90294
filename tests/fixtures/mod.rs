//! Test fixtures for the board drivers.
//!
//! Provides:
//! - `MockPin`: an `OutputPin` that records every level it is driven to
//! - `MockSpi`: a 16 bit `SpiDevice` that records every transaction
//! - `Events`: the shared, ordered log both of them write into

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

/// Error returned by mocks set up to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A pin was driven, `true` is high.
    Pin(&'static str, bool),
    /// One SPI transaction, with the words it wrote.
    Transaction(Vec<u16>),
}

/// Ordered log shared by all mocks of one test.
#[derive(Debug, Clone, Default)]
pub struct Events(Rc<RefCell<Vec<Event>>>);

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        self.0.borrow_mut().drain(..).collect()
    }

    /// Levels driven on one pin, in order.
    pub fn levels(&self, name: &str) -> Vec<bool> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Pin(pin, level) if *pin == name => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct MockPin {
    name: &'static str,
    events: Events,
    fail: bool,
}

impl MockPin {
    pub fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: events.clone(),
            fail: false,
        }
    }

    /// A pin whose every write fails.
    pub fn broken(name: &'static str, events: &Events) -> Self {
        Self {
            fail: true,
            ..Self::new(name, events)
        }
    }

    fn drive(&mut self, level: bool) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError);
        }
        self.events.push(Event::Pin(self.name, level));
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

pub struct MockSpi {
    events: Events,
    fail: bool,
}

impl MockSpi {
    pub fn new(events: &Events) -> Self {
        Self {
            events: events.clone(),
            fail: false,
        }
    }

    pub fn broken(events: &Events) -> Self {
        Self {
            fail: true,
            ..Self::new(events)
        }
    }
}

impl spi::ErrorType for MockSpi {
    type Error = MockError;
}

impl SpiDevice<u16> for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u16>]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }

        let mut written = Vec::new();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(words) => written.extend_from_slice(words),
                Operation::Transfer(read, write) => {
                    written.extend_from_slice(write);
                    read.fill(0);
                }
                Operation::TransferInPlace(words) => {
                    written.extend_from_slice(words);
                    words.fill(0);
                }
                Operation::Read(words) => words.fill(0),
                Operation::DelayNs(_) => {}
            }
        }

        self.events.push(Event::Transaction(written));
        Ok(())
    }
}

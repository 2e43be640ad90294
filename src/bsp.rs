//! Drivers for the parts wired to the board.
//!
//! These only depend on `embedded-hal` traits, so they work with the pins and SPI bus from
//! `hardware` as well as with anything else implementing the traits.

pub mod mcp4822;
pub mod sn74hc595;

pub use self::mcp4822::{Channel, Gain, Mcp4822};
pub use self::sn74hc595::{Sn74hc595, SEVEN_SEGMENT_DIGITS};

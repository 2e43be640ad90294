#![cfg_attr(not(test), no_std)]
//! Peripheral and board support for the STM32F103.
//!
//! - [`timebase`]: millisecond tick counter fed by SysTick, busy-wait delay and polled
//!   timeout timers. Runs anywhere.
//! - [`config`]: clock constants and register configuration words. Runs anywhere.
//! - [`bsp`]: shift register and DAC drivers on top of `embedded-hal`.
//! - `hardware`: register level drivers and board bring-up, only built for the MCU.
//! - `rtt_logger`: `log` backend over RTT, only built for the MCU.

pub mod bsp;
pub mod config;
#[cfg(target_os = "none")]
pub mod hardware;
#[cfg(target_os = "none")]
pub mod rtt_logger;
pub mod timebase;

//! SysTick as the 1 ms tick source of [`crate::timebase`].
//!

use cortex_m::peripheral::{syst::SystClkSource, SYST};

use super::rcc::Clocks;
use crate::{config, timebase};

/// Takes ownership of the SysTick core peripheral.
/// Make sure to call `interrupt_handler()` from the `SysTick` exception handler.
pub struct SysTick {
    syst: SYST,
}

impl SysTick {
    /// Roll over every millisecond from the processor clock and raise the exception on
    /// every roll over.
    pub fn start(mut syst: SYST, clocks: &Clocks) -> Self {
        let reload = match config::systick_reload(clocks.hclk(), config::TICK_HZ) {
            Ok(reload) => reload,
            Err(e) => panic!("SysTick: {e}"),
        };

        // Load, clear the current value, then configure and enable, in that order
        syst.disable_counter();
        syst.set_reload(reload);
        syst.clear_current();
        syst.set_clock_source(SystClkSource::Core);
        syst.enable_interrupt();
        syst.enable_counter();

        log::info!("SysTick running, reload {reload}");

        Self { syst }
    }

    /// Call this from the SysTick exception handler
    #[inline]
    pub fn interrupt_handler() {
        timebase::on_tick();
    }

    pub fn stop(mut self) -> SYST {
        self.syst.disable_interrupt();
        self.syst.disable_counter();
        self.syst
    }
}

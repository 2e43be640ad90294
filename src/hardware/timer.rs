//! TIM2 general purpose timer: polled update events and output compare toggling.
//!

use cortex_m::peripheral::NVIC;
use fugit::{HertzU32, TimerDurationU32, TimerInstantU32};
use stm32ral::{modify_reg, read_reg, tim2, write_reg};

use super::rcc::{self, Clocks};
use crate::config::{self, ConfigError};

/// Output compare toggle, `OCxM = 0b011`.
const OCM_TOGGLE: u32 = 0b011;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    C1,
    C2,
    C3,
    C4,
}

/// TIM2 counting at `TIMER_HZ`.
pub struct Timer<const TIMER_HZ: u32> {
    timer: tim2::Instance,
}

impl<const TIMER_HZ: u32> Timer<TIMER_HZ> {
    pub fn new(timer: tim2::Instance, clocks: &Clocks) -> Self {
        rcc::enable_rst_timer2();

        let clock_speed = clocks.timclk1();

        // (PSC+1)*(ARR+1) = TIMclk/Updatefrequency = TIMclk * period
        let psc = match config::timer_prescaler(clock_speed, HertzU32::from_raw(TIMER_HZ)) {
            Ok(psc) => psc,
            Err(e) => panic!("Tim2: Cannot make required rate ({TIMER_HZ:?}): {e}"),
        };

        write_reg!(tim2, timer, PSC, psc as u32);

        // Trigger update event to commit PSC, it is only loaded on an update
        write_reg!(tim2, timer, EGR, UG: 1);
        write_reg!(tim2, timer, SR, 0);
        write_reg!(tim2, timer, CNT, 0);

        log::debug!("Tim2 counting at {TIMER_HZ} Hz, PSC {psc}");

        Self { timer }
    }

    /// Start counting, with an update event every `period`.
    pub fn start(&mut self, period: TimerDurationU32<TIMER_HZ>) -> Result<(), ConfigError> {
        let arr = period
            .ticks()
            .checked_sub(1)
            .filter(|arr| *arr <= u16::MAX as u32)
            .ok_or(ConfigError::TimerOutOfRange(period.ticks()))?;

        self.load(arr);
        Ok(())
    }

    /// Start counting, with update events at `update_rate`.
    pub fn start_rate(&mut self, update_rate: HertzU32) -> Result<(), ConfigError> {
        let arr = config::timer_auto_reload(HertzU32::from_raw(TIMER_HZ), update_rate)?;

        self.load(arr as u32);
        Ok(())
    }

    fn load(&mut self, arr: u32) {
        modify_reg!(tim2, self.timer, CR1, CEN: 0);
        write_reg!(tim2, self.timer, ARR, arr);
        write_reg!(tim2, self.timer, CNT, 0);
        modify_reg!(tim2, self.timer, SR, UIF: 0);

        // enable timer
        modify_reg!(tim2, self.timer, CR1, CEN: 1);
    }

    /// Ok once per update event; clears the update flag.
    pub fn wait(&mut self) -> nb::Result<(), ConfigError> {
        if read_reg!(tim2, self.timer, SR, UIF == 1) {
            modify_reg!(tim2, self.timer, SR, UIF: 0);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    pub fn cancel(&mut self) {
        modify_reg!(tim2, self.timer, CR1, CEN: 0);
    }

    pub fn count(&self) -> u32 {
        read_reg!(tim2, self.timer, CNT)
    }

    /// Let the timer flip the channel output whenever the counter matches `compare`.
    /// The channel pin has to be configured as an alternate function output.
    pub fn toggle_on_match(&mut self, channel: Channel, compare: u16) {
        let compare = compare as u32;

        match channel {
            Channel::C1 => {
                modify_reg!(tim2, self.timer, CCMR1, OC1M: OCM_TOGGLE);
                write_reg!(tim2, self.timer, CCR1, compare);
                modify_reg!(tim2, self.timer, CCER, CC1E: 1);
            }
            Channel::C2 => {
                modify_reg!(tim2, self.timer, CCMR1, OC2M: OCM_TOGGLE);
                write_reg!(tim2, self.timer, CCR2, compare);
                modify_reg!(tim2, self.timer, CCER, CC2E: 1);
            }
            Channel::C3 => {
                modify_reg!(tim2, self.timer, CCMR2, OC3M: OCM_TOGGLE);
                write_reg!(tim2, self.timer, CCR3, compare);
                modify_reg!(tim2, self.timer, CCER, CC3E: 1);
            }
            Channel::C4 => {
                modify_reg!(tim2, self.timer, CCMR2, OC4M: OCM_TOGGLE);
                write_reg!(tim2, self.timer, CCR4, compare);
                modify_reg!(tim2, self.timer, CCER, CC4E: 1);
            }
        }
    }

    /// Raise the TIM2 interrupt on every update event.
    pub fn listen(&mut self) {
        modify_reg!(tim2, self.timer, DIER, UIE: 1);
        unsafe {
            NVIC::unmask(stm32ral::Interrupt::TIM2);
        }
    }

    pub fn unlisten(&mut self) {
        modify_reg!(tim2, self.timer, DIER, UIE: 0);
        NVIC::mask(stm32ral::Interrupt::TIM2);
    }
}

impl<const TIMER_HZ: u32> fugit_timer::Timer<TIMER_HZ> for Timer<TIMER_HZ> {
    type Error = ConfigError;

    fn now(&mut self) -> TimerInstantU32<TIMER_HZ> {
        TimerInstantU32::from_ticks(self.count())
    }

    fn start(&mut self, duration: TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error> {
        Timer::start(self, duration)
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        Timer::cancel(self);
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        Timer::wait(self)
    }
}

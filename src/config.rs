//! Board constants and the configuration words derived from them.
//!
//! Nothing in here touches a register. The `hardware` drivers take these values and write
//! them; keeping the arithmetic separate lets it run on the host.

use core::fmt;

use fugit::HertzU32;

/// Internal RC oscillator.
pub const HSI_HZ: HertzU32 = HertzU32::MHz(8);

/// PLL input is HSI / 2, multiplied by 8.
pub const PLL_MUL: u32 = 8;

/// System clock once the PLL is selected by `Rcc::setup`.
pub const SYSCLK_HZ: HertzU32 = HertzU32::MHz(32);

/// SysTick interrupt rate driving the millisecond timebase.
pub const TICK_HZ: HertzU32 = HertzU32::from_raw(crate::timebase::TICK_HZ);

/// Largest value the 24 bit SysTick reload register holds.
pub const SYSTICK_MAX_RELOAD: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A rate of 0 Hz was requested.
    ZeroRate,
    /// The requested rate does not divide the source clock.
    InexactRate { clock: u32, rate: u32 },
    /// The computed reload does not fit the 24 bit SysTick reload register.
    ReloadOutOfRange(u32),
    /// The computed prescaler or auto-reload does not fit a 16 bit timer register.
    TimerOutOfRange(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroRate => write!(f, "rate must be non-zero"),
            ConfigError::InexactRate { clock, rate } => {
                write!(f, "cannot make {rate} Hz from a {clock} Hz clock")
            }
            ConfigError::ReloadOutOfRange(reload) => {
                write!(f, "SysTick reload {reload} exceeds 24 bits")
            }
            ConfigError::TimerOutOfRange(value) => {
                write!(f, "timer register value {value} exceeds 16 bits")
            }
        }
    }
}

fn exact_ratio(clock: HertzU32, rate: HertzU32) -> Result<u32, ConfigError> {
    if rate.raw() == 0 {
        return Err(ConfigError::ZeroRate);
    }
    if clock.raw() % rate.raw() != 0 || clock.raw() < rate.raw() {
        return Err(ConfigError::InexactRate {
            clock: clock.raw(),
            rate: rate.raw(),
        });
    }
    Ok(clock.raw() / rate.raw())
}

/// SysTick LOAD value so that the counter rolls over at `rate`.
pub fn systick_reload(clock: HertzU32, rate: HertzU32) -> Result<u32, ConfigError> {
    let reload = exact_ratio(clock, rate)? - 1;

    if reload > SYSTICK_MAX_RELOAD {
        return Err(ConfigError::ReloadOutOfRange(reload));
    }

    Ok(reload)
}

fn timer_register(ratio: u32) -> Result<u16, ConfigError> {
    // (PSC+1) and (ARR+1) are the actual dividers
    u16::try_from(ratio - 1).map_err(|_| ConfigError::TimerOutOfRange(ratio - 1))
}

/// TIMx PSC value dividing `timer_clock` down to `count_rate`.
pub fn timer_prescaler(timer_clock: HertzU32, count_rate: HertzU32) -> Result<u16, ConfigError> {
    timer_register(exact_ratio(timer_clock, count_rate)?)
}

/// TIMx ARR value producing an update event at `update_rate` from `count_rate`.
pub fn timer_auto_reload(count_rate: HertzU32, update_rate: HertzU32) -> Result<u16, ConfigError> {
    timer_register(exact_ratio(count_rate, update_rate)?)
}

/// FLASH_ACR LATENCY for a system clock.
pub fn flash_latency(sysclk: HertzU32) -> u32 {
    match sysclk.raw() {
        0..=24_000_000 => 0b000,
        24_000_001..=48_000_000 => 0b001,
        _ => 0b010,
    }
}

/// PLLMUL field value for a multiplier of 2 to 16.
pub fn pll_mul_bits(multiplier: u32) -> u32 {
    multiplier.clamp(2, 16) - 2
}

// GPIO -----------------------------------------------------------------------

/// Maximum output slew rate; the MODEy field of an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Max10MHz,
    Max2MHz,
    Max50MHz,
}

impl Speed {
    fn bits(self) -> u32 {
        match self {
            Speed::Max10MHz => 0b01,
            Speed::Max2MHz => 0b10,
            Speed::Max50MHz => 0b11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    PushPull,
    OpenDrain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Down,
    Up,
}

/// Pin configuration as stored in the `GPIOx_CRL`/`GPIOx_CRH` nibble of each pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// For the ADC; digital input path disconnected.
    Analog,
    Floating,
    /// Input with the internal pull resistor selected through `ODR`.
    Pulled(Pull),
    /// General purpose output, driven by `ODR`.
    Output(OutputType, Speed),
    /// Output driven by a peripheral (SPI, timer channel, ...).
    Alternate(OutputType, Speed),
}

impl PinMode {
    pub fn cnf(&self) -> u32 {
        match self {
            PinMode::Analog => 0b00,
            PinMode::Floating => 0b01,
            PinMode::Pulled(_) => 0b10,
            PinMode::Output(OutputType::PushPull, _) => 0b00,
            PinMode::Output(OutputType::OpenDrain, _) => 0b01,
            PinMode::Alternate(OutputType::PushPull, _) => 0b10,
            PinMode::Alternate(OutputType::OpenDrain, _) => 0b11,
        }
    }

    pub fn mode(&self) -> u32 {
        match self {
            PinMode::Output(_, speed) | PinMode::Alternate(_, speed) => speed.bits(),
            _ => 0b00,
        }
    }

    /// `CNFy[1:0]` followed by `MODEy[1:0]`.
    pub fn nibble(&self) -> u32 {
        (self.cnf() << 2) | self.mode()
    }

    pub fn pull(&self) -> Option<Pull> {
        match self {
            PinMode::Pulled(pull) => Some(*pull),
            _ => None,
        }
    }
}

/// Which configuration register holds `pin` (true for `CRH`) and the nibble shift in it.
pub fn cr_position(pin: u8) -> (bool, u32) {
    (pin >= 8, u32::from(pin % 8) * 4)
}

// SPI ------------------------------------------------------------------------

/// SPI clock divider applied to fPCLK; the `BR` field of `SPI_CR1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BaudDivider {
    Div2 = 0b000,
    Div4 = 0b001,
    Div8 = 0b010,
    Div16 = 0b011,
    Div32 = 0b100,
    Div64 = 0b101,
    Div128 = 0b110,
    Div256 = 0b111,
}

impl BaudDivider {
    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn divisor(self) -> u32 {
        2 << self.bits()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Bits8,
    Bits16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub baud: BaudDivider,
    pub frame: FrameFormat,
    pub bit_order: BitOrder,
}

impl SpiConfig {
    pub fn dff(&self) -> u32 {
        match self.frame {
            FrameFormat::Bits8 => 0,
            FrameFormat::Bits16 => 1,
        }
    }

    pub fn lsbfirst(&self) -> u32 {
        match self.bit_order {
            BitOrder::MsbFirst => 0,
            BitOrder::LsbFirst => 1,
        }
    }

    /// SCK frequency for a given peripheral clock.
    pub fn sck(&self, pclk: HertzU32) -> HertzU32 {
        pclk / self.baud.divisor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn systick_reload_for_one_millisecond() {
        assert_eq!(systick_reload(SYSCLK_HZ, TICK_HZ), Ok(31_999));
        assert_eq!(systick_reload(HertzU32::MHz(72), TICK_HZ), Ok(71_999));
    }

    #[test]
    fn systick_reload_rejects_bad_rates() {
        assert_eq!(
            systick_reload(SYSCLK_HZ, HertzU32::Hz(1)),
            Err(ConfigError::ReloadOutOfRange(31_999_999))
        );
        assert_eq!(
            systick_reload(SYSCLK_HZ, HertzU32::Hz(7)),
            Err(ConfigError::InexactRate {
                clock: 32_000_000,
                rate: 7
            })
        );
        assert_eq!(systick_reload(SYSCLK_HZ, HertzU32::Hz(0)), Err(ConfigError::ZeroRate));
    }

    #[test]
    fn timer_dividers_for_blink_rates() {
        let count = HertzU32::kHz(10);
        assert_eq!(timer_prescaler(SYSCLK_HZ, count), Ok(3_199));
        assert_eq!(timer_auto_reload(count, HertzU32::Hz(1)), Ok(9_999));
        assert_eq!(timer_auto_reload(count, HertzU32::Hz(10)), Ok(999));
        assert_eq!(
            timer_prescaler(SYSCLK_HZ, HertzU32::Hz(100)),
            Err(ConfigError::TimerOutOfRange(319_999))
        );
    }

    #[test]
    fn flash_wait_states() {
        assert_eq!(flash_latency(HertzU32::MHz(8)), 0);
        assert_eq!(flash_latency(HertzU32::MHz(24)), 0);
        assert_eq!(flash_latency(SYSCLK_HZ), 1);
        assert_eq!(flash_latency(HertzU32::MHz(72)), 2);
    }

    #[test]
    fn pll_multiplier_encoding() {
        assert_eq!(pll_mul_bits(PLL_MUL), 0b0110);
        assert_eq!(HSI_HZ / 2 * PLL_MUL, SYSCLK_HZ);
    }

    #[test]
    fn pin_mode_nibbles() {
        let cases = [
            (PinMode::Analog, 0b0000),
            (PinMode::Floating, 0b0100),
            (PinMode::Pulled(Pull::Up), 0b1000),
            (PinMode::Output(OutputType::PushPull, Speed::Max10MHz), 0b0001),
            (PinMode::Output(OutputType::OpenDrain, Speed::Max2MHz), 0b0110),
            (PinMode::Alternate(OutputType::PushPull, Speed::Max50MHz), 0b1011),
            (PinMode::Alternate(OutputType::OpenDrain, Speed::Max50MHz), 0b1111),
        ];
        for (mode, nibble) in cases {
            assert_eq!(mode.nibble(), nibble, "{mode:?}");
        }
        assert_eq!(PinMode::Pulled(Pull::Down).pull(), Some(Pull::Down));
        assert_eq!(PinMode::Floating.pull(), None);
    }

    #[test]
    fn config_register_position() {
        assert_eq!(cr_position(0), (false, 0));
        assert_eq!(cr_position(5), (false, 20));
        assert_eq!(cr_position(8), (true, 0));
        assert_eq!(cr_position(15), (true, 28));
    }

    #[test]
    fn spi_fields() {
        let config = SpiConfig {
            baud: BaudDivider::Div64,
            frame: FrameFormat::Bits16,
            bit_order: BitOrder::LsbFirst,
        };
        assert_eq!(config.baud.bits(), 0b101);
        assert_eq!(config.dff(), 1);
        assert_eq!(config.lsbfirst(), 1);
        assert_eq!(config.sck(SYSCLK_HZ), HertzU32::kHz(500));
        assert_eq!(BaudDivider::Div2.divisor(), 2);
        assert_eq!(BaudDivider::Div256.divisor(), 256);
    }
}

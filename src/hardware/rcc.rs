//! Peripheral reset and clock configuration module
//!

use cortex_m::interrupt::free;
use fugit::HertzU32;
use stm32ral::{flash, rcc};
use stm32ral::{modify_reg, read_reg, reset_reg};

use crate::config;

pub struct Rcc {
    rcc: rcc::Instance,
}

/// Read only struct for obtaining clock rates.
pub struct Clocks {
    sysclk: HertzU32,
}

impl Clocks {
    pub fn sysclk(&self) -> HertzU32 {
        self.sysclk
    }

    pub fn hclk(&self) -> HertzU32 {
        let rcc = unsafe { &*rcc::RCC };
        let hpre = read_reg!(rcc, rcc, CFGR, HPRE);
        match hpre {
            0b1000 => self.sysclk() / 2,
            0b1001 => self.sysclk() / 4,
            0b1010 => self.sysclk() / 8,
            0b1011 => self.sysclk() / 16,
            0b1100 => self.sysclk() / 64,
            0b1101 => self.sysclk() / 128,
            0b1110 => self.sysclk() / 256,
            0b1111 => self.sysclk() / 512,
            _ => self.sysclk(),
        }
    }

    pub fn pclk1(&self) -> HertzU32 {
        let rcc = unsafe { &*rcc::RCC };
        apb_divide(self.hclk(), read_reg!(rcc, rcc, CFGR, PPRE1))
    }

    pub fn pclk2(&self) -> HertzU32 {
        let rcc = unsafe { &*rcc::RCC };
        apb_divide(self.hclk(), read_reg!(rcc, rcc, CFGR, PPRE2))
    }

    /// Clock of TIM2..TIM7. Doubled by hardware whenever APB1 is divided.
    pub fn timclk1(&self) -> HertzU32 {
        let rcc = unsafe { &*rcc::RCC };
        if read_reg!(rcc, rcc, CFGR, PPRE1) < 0b100 {
            self.pclk1()
        } else {
            self.pclk1() * 2
        }
    }
}

fn apb_divide(hclk: HertzU32, ppre: u32) -> HertzU32 {
    match ppre {
        0b100 => hclk / 2,
        0b101 => hclk / 4,
        0b110 => hclk / 8,
        0b111 => hclk / 16,
        _ => hclk,
    }
}

impl Rcc {
    pub fn new(rcc: rcc::Instance) -> Self {
        Rcc { rcc }
    }

    pub fn setup(&self) -> Clocks {
        // At power up we're running from the HSI at 8 MHz
        modify_reg!(rcc, self.rcc, CR, HSION: 1);
        while read_reg!(rcc, self.rcc, CR, HSIRDY != 1) {}

        // PLL can only be configured while it is off
        modify_reg!(rcc, self.rcc, CR, PLLON: 0);
        while read_reg!(rcc, self.rcc, CR, PLLRDY != 0) {}

        // SYSCLK = HSI / 2 x PLLMUL = 8 MHz / 2 x 8 = 32 MHz
        modify_reg!(
            rcc,
            self.rcc,
            CFGR,
            PLLSRC: 0, // HSI / 2
            PLLMUL: config::pll_mul_bits(config::PLL_MUL)
        );

        modify_reg!(rcc, self.rcc, CR, PLLON: 1);
        // Wait for the PLL to lock
        while read_reg!(rcc, self.rcc, CR, PLLRDY != 1) {}

        // AHB, APB1 and APB2 undivided. APB1 is limited to 36 MHz, fine at 32 MHz.
        modify_reg!(rcc, self.rcc, CFGR, HPRE: 0, PPRE1: 0, PPRE2: 0);

        // Disable all peripherals clocks, drivers enable what they use
        reset_reg!(rcc, self.rcc, RCC, AHBENR);
        reset_reg!(rcc, self.rcc, RCC, APB1ENR);
        reset_reg!(rcc, self.rcc, RCC, APB2ENR);

        // Adjust flash wait states before raising the clock
        let latency = config::flash_latency(config::SYSCLK_HZ);
        unsafe { modify_reg!(flash, flash::FLASH, ACR, LATENCY: latency) }

        // Swap system clock to PLL
        modify_reg!(rcc, self.rcc, CFGR, SW: 0b10);

        // Wait for system clock to be PLL
        while read_reg!(rcc, self.rcc, CFGR, SWS != 0b10) {}

        log::debug!("flash latency {latency}, PLL x{}", config::PLL_MUL);

        Clocks {
            sysclk: config::SYSCLK_HZ,
        }
    }
}

/// Enables the peripheral clock for the alternate function I/O block
/// And resets the peripheral
pub fn enable_rst_afio() {
    free(|_| {
        unsafe {
            modify_reg!(rcc, RCC, APB2ENR, AFIOEN: 1);
            modify_reg!(rcc, RCC, APB2RSTR, AFIORST: 1);
            modify_reg!(rcc, RCC, APB2RSTR, AFIORST: 0);
        };
    });
}

/// Enables the peripheral clock for the SPI1 peripheral
/// And resets the peripheral
pub fn enable_rst_spi1() {
    free(|_| {
        unsafe {
            // Enable peripheral clock
            modify_reg!(rcc, RCC, APB2ENR, SPI1EN: 1);
            // Reset peripheral
            modify_reg!(rcc, RCC, APB2RSTR, SPI1RST: 1);
            modify_reg!(rcc, RCC, APB2RSTR, SPI1RST: 0);
        };
    });
}

/// Enables the peripheral clock for the TIMER2 peripheral
/// And resets the peripheral
pub fn enable_rst_timer2() {
    free(|_| {
        unsafe {
            // Enable peripheral clock
            modify_reg!(rcc, RCC, APB1ENR, TIM2EN: 1);
            // Reset peripheral
            modify_reg!(rcc, RCC, APB1RSTR, TIM2RST: 1);
            modify_reg!(rcc, RCC, APB1RSTR, TIM2RST: 0);
        };
    });
}

use paste::paste;

macro_rules! enable_rst_gpio {
    ($port: tt) => {
        paste! {
            /// Enables and resets the I/O port.
            pub fn [<enable_rst_gpio $port:lower>] () {
                free(|_| {
                    unsafe {
                        modify_reg!(rcc, RCC, APB2ENR, [<IOP $port EN>]: 1);
                        modify_reg!(rcc, RCC, APB2RSTR, [<IOP $port RST>]: 1);
                        modify_reg!(rcc, RCC, APB2RSTR, [<IOP $port RST>]: 0);
                    }
                })
            }

            /// Returns true if the I/O port clock is enabled.
            pub fn [<gpio $port:lower _is_enabled>] () -> bool {
                unsafe { read_reg!(stm32ral::rcc, RCC, APB2ENR, [<IOP $port EN>] == 1) }
            }

        }
    };
}

enable_rst_gpio!(A);
enable_rst_gpio!(B);
enable_rst_gpio!(C);
enable_rst_gpio!(D);
enable_rst_gpio!(E);

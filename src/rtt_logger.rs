//! `log` backend over RTT. Trace records get their own up channel so they can be
//! left unread without stalling the regular output.

use core::fmt::Write;

use core::cell::RefCell;
use cortex_m::interrupt::Mutex;
use log::{LevelFilter, Metadata, Record};
use rtt_target::{rprintln, rtt_init, set_print_channel, UpChannel};

use crate::timebase;

pub struct Logger {
    pub trace_channel: Mutex<RefCell<Option<UpChannel>>>,
}

static LOGGER: Logger = Logger {
    trace_channel: Mutex::new(RefCell::new(None)),
};

/// Set up the RTT channels and install the logger. Only the first call has effect.
pub fn init(level: LevelFilter) {
    let channels = rtt_init! {
        up: {
            0: {
                size: 1024
                mode: NoBlockSkip
                name: "Terminal"
            }
            1: {
                size: 256
                mode: NoBlockSkip
                name: "Trace"
            }
        }
    };

    let output = channels.up.0;
    let trace_channel = channels.up.1;

    cortex_m::interrupt::free(|cs| {
        LOGGER.trace_channel.borrow(cs).replace(Some(trace_channel));
    });

    set_print_channel(output);

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = timebase::now_ms();
        match record.level() {
            log::Level::Trace => {
                cortex_m::interrupt::free(|cs| {
                    if let Some(tx) = self.trace_channel.borrow(cs).borrow_mut().as_mut() {
                        writeln!(tx, "[{now}] {}", record.args()).ok();
                    }
                });
            }
            _ => rprintln!("[{}] {} - {}", now, record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

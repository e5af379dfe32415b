// Licensed under the Apache-2.0 license

//! Crate-wide helpers shared by the driver modules.
//!
//! The driver logs through the [`Logger`] trait so that the same code runs
//! silently in production ([`NoOpLogger`]) or writes to a debug console
//! ([`UartLogger`]) without pulling formatting machinery into the interrupt
//! path. Only mainline code logs; interrupt handlers never do.

use core::fmt::{self, Write as _};
use heapless::String;

/// Maximum length of a formatted log line. Longer lines are truncated.
pub const LOG_LINE_LEN: usize = 96;

/// Sink for driver diagnostics.
pub trait Logger {
    fn debug(&mut self, msg: &str);

    fn error(&mut self, msg: &str);

    /// Format `args` into a fixed-size line and forward it to [`Logger::debug`].
    fn debug_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut line: String<LOG_LINE_LEN> = String::new();
        // Overflow only truncates the line.
        let _ = line.write_fmt(args);
        self.debug(&line);
    }

    /// Format `args` into a fixed-size line and forward it to [`Logger::error`].
    fn error_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut line: String<LOG_LINE_LEN> = String::new();
        let _ = line.write_fmt(args);
        self.error(&line);
    }
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}

    fn error(&mut self, _msg: &str) {}

    fn debug_fmt(&mut self, _args: fmt::Arguments<'_>) {}

    fn error_fmt(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Logger writing one line per message to a serial console.
///
/// Write errors are ignored: a broken console must not stall the bus driver.
pub struct UartLogger<W: embedded_io::Write> {
    writer: W,
}

impl<W: embedded_io::Write> UartLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, level: &str, msg: &str) {
        let _ = self.writer.write_all(level.as_bytes());
        let _ = self.writer.write_all(msg.as_bytes());
        let _ = self.writer.write_all(b"\r\n");
    }
}

impl<W: embedded_io::Write> Logger for UartLogger<W> {
    fn debug(&mut self, msg: &str) {
        self.line("[D] ", msg);
    }

    fn error(&mut self, msg: &str) {
        self.line("[E] ", msg);
    }
}

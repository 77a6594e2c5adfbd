// Licensed under the Apache-2.0 license

//! Shared logging capability for driver modules.
//!
//! Drivers take a `Logger` type parameter so that transaction failures can be
//! reported without coupling the driver to a particular output peripheral.
//! Production images that do not want the overhead use [`NoOpLogger`];
//! anything implementing `embedded_io::Write` (a UART, a test buffer) can be
//! wrapped in [`WriteLogger`].

/// Diagnostic message sink.
pub trait Logger {
    /// Emit a single diagnostic message.
    fn log(&mut self, message: &str);
}

/// Logger that discards every message.
pub struct NoOpLogger {}

impl Logger for NoOpLogger {
    fn log(&mut self, _message: &str) {}
}

/// Logger writing line-terminated messages to an `embedded_io` sink.
///
/// Write errors are swallowed: logging must never influence driver control
/// flow.
pub struct WriteLogger<W: embedded_io::Write> {
    writer: W,
}

impl<W: embedded_io::Write> WriteLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the logger and hand back the underlying sink.
    pub fn release(self) -> W {
        self.writer
    }
}

impl<W: embedded_io::Write> Logger for WriteLogger<W> {
    fn log(&mut self, message: &str) {
        let _ = self.writer.write_all(message.as_bytes());
        let _ = self.writer.write_all(b"\r\n");
    }
}

use std::io;

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Console method a formatted line goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
    Log,
}

/// Picks the console method from the level token `fmt` writes first.
pub fn console_level(line: &str) -> ConsoleLevel {
    match line.split_whitespace().next() {
        Some("ERROR") => ConsoleLevel::Error,
        Some("WARN") => ConsoleLevel::Warn,
        _ => ConsoleLevel::Log,
    }
}

/// Buffers one event and flushes it to the console when dropped.
#[derive(Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        let message = wasm_bindgen::JsValue::from_str(line);
        match console_level(line) {
            ConsoleLevel::Error => web_sys::console::error_1(&message),
            ConsoleLevel::Warn => web_sys::console::warn_1(&message),
            ConsoleLevel::Log => web_sys::console::log_1(&message),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// `window.PAINEL_DEBUG` raises the level to debug.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let installed = tracing_subscriber::fmt()
        .with_writer(MakeConsoleWriter)
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

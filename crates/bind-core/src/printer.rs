#![forbid(unsafe_code)]

//! Debug sinks for observable tracing.
//!
//! An observable switched into debug mode with
//! [`Observable::debug`](crate::Observable::debug) writes one line per event
//! (bind, replay, will-update, did-update) to a [`Printer`]. The printer is
//! injected per observable; there is no process-wide sink.
//!
//! [`PrinterConfig`] builds a printer from a destination description, which is
//! the only fallible step in this crate.

use std::cell::RefCell;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, warn};

/// Line-oriented diagnostic sink.
pub trait Printer {
    /// Emit one line. Must not fail.
    fn print(&self, line: &str);
}

/// Prints each line to stdout. Used when no printer is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutPrinter;

impl Printer for StdoutPrinter {
    fn print(&self, line: &str) {
        println!("{line}");
    }
}

/// Routes each line through `tracing` as a `DEBUG` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPrinter;

impl Printer for TracingPrinter {
    fn print(&self, line: &str) {
        debug!(target: "bind_core::printer", line, "observable trace");
    }
}

/// Appends lines to any writer, optionally flushing after each one.
///
/// Write errors are reported as `tracing` warnings and otherwise dropped.
pub struct WriterPrinter {
    writer: RefCell<BufWriter<Box<dyn Write>>>,
    flush_on_write: bool,
}

impl WriterPrinter {
    /// Wrap `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, flush_on_write: bool) -> Self {
        Self {
            writer: RefCell::new(BufWriter::new(writer)),
            flush_on_write,
        }
    }

    /// Flush buffered output.
    pub fn flush(&self) -> io::Result<()> {
        self.writer.borrow_mut().flush()
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.borrow_mut();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        if self.flush_on_write {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Printer for WriterPrinter {
    fn print(&self, line: &str) {
        if let Err(err) = self.write_line(line) {
            warn!(error = %err, "debug printer write failed");
        }
    }
}

impl fmt::Debug for WriterPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterPrinter")
            .field("flush_on_write", &self.flush_on_write)
            .finish_non_exhaustive()
    }
}

/// Records every line in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturingPrinter {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CapturingPrinter {
    /// Create an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    /// Whether nothing was captured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// Drop captured lines.
    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Printer for CapturingPrinter {
    fn print(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_owned());
    }
}

/// Where debug lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterDestination {
    /// Write to stdout.
    Stdout,
    /// Emit `tracing` events.
    Tracing,
    /// Append to a file at the given path.
    File(PathBuf),
}

impl PrinterDestination {
    /// Convenience helper for file destinations.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

/// Configuration for the debug printer.
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// When disabled, lines are discarded.
    pub enabled: bool,
    /// Output destination.
    pub destination: PrinterDestination,
    /// Flush after every line (file destination only).
    pub flush_on_write: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination: PrinterDestination::Stdout,
            flush_on_write: true,
        }
    }
}

impl PrinterConfig {
    /// A config whose printer discards every line.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default().with_enabled(false)
    }

    /// Route lines through `tracing`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::default().with_destination(PrinterDestination::Tracing)
    }

    /// Append lines to a file with flush-on-write.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::default().with_destination(PrinterDestination::file(path))
    }

    /// Set whether printing is enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the destination.
    #[must_use]
    pub fn with_destination(mut self, destination: PrinterDestination) -> Self {
        self.destination = destination;
        self
    }

    /// Set flush-on-write behavior.
    #[must_use]
    pub fn with_flush_on_write(mut self, flush_on_write: bool) -> Self {
        self.flush_on_write = flush_on_write;
        self
    }

    /// Build the printer. Fails only when a file destination cannot be opened.
    pub fn build(&self) -> io::Result<Rc<dyn Printer>> {
        if !self.enabled {
            return Ok(Rc::new(NullPrinter));
        }
        let printer: Rc<dyn Printer> = match &self.destination {
            PrinterDestination::Stdout => Rc::new(StdoutPrinter),
            PrinterDestination::Tracing => Rc::new(TracingPrinter),
            PrinterDestination::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Rc::new(WriterPrinter::new(Box::new(file), self.flush_on_write))
            }
        };
        Ok(printer)
    }
}

struct NullPrinter;

impl Printer for NullPrinter {
    fn print(&self, _line: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tracing_test::traced_test;

    #[test]
    fn capturing_printer_shares_buffer() {
        let printer = CapturingPrinter::new();
        let handle = printer.clone();

        printer.print("---");
        printer.print("second");

        assert_eq!(handle.lines(), vec!["---".to_string(), "second".to_string()]);
        handle.clear();
        assert!(printer.is_empty());
    }

    #[test]
    fn config_builders() {
        let config = PrinterConfig::file("/tmp/trace.log").with_flush_on_write(false);
        assert!(config.enabled);
        assert_eq!(config.destination, PrinterDestination::file("/tmp/trace.log"));
        assert!(!config.flush_on_write);

        assert!(!PrinterConfig::disabled().enabled);
        assert_eq!(PrinterConfig::tracing().destination, PrinterDestination::Tracing);
    }

    #[test]
    fn file_destination_appends_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trace.log");

        let printer = PrinterConfig::file(&path).build().expect("open file");
        printer.print("---");
        printer.print("Did update value for x (Observable<i32>) to 1");
        drop(printer);

        let mut contents = String::new();
        std::fs::File::open(&path)
            .expect("reopen")
            .read_to_string(&mut contents)
            .expect("read");
        assert_eq!(
            contents,
            "---\nDid update value for x (Observable<i32>) to 1\n"
        );
    }

    #[test]
    fn file_destination_open_error_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("trace.log");

        assert!(PrinterConfig::file(path).build().is_err());
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_printer_buffers_until_flush() {
        let buffer = SharedBuffer::default();
        let printer = WriterPrinter::new(Box::new(buffer.clone()), false);

        printer.print("buffered");
        assert!(buffer.0.borrow().is_empty());

        printer.flush().expect("flush into buffer");
        assert_eq!(buffer.0.borrow().as_slice(), b"buffered\n");
    }

    #[test]
    fn writer_printer_flushes_each_line_when_asked() {
        let buffer = SharedBuffer::default();
        let printer = WriterPrinter::new(Box::new(buffer.clone()), true);

        printer.print("eager");
        assert_eq!(buffer.0.borrow().as_slice(), b"eager\n");
    }

    #[traced_test]
    #[test]
    fn tracing_printer_emits_debug_event() {
        TracingPrinter.print("Binding counter (Observable<i32>) to (Function)");
        assert!(logs_contain("observable trace"));
        assert!(logs_contain("Binding counter"));
    }
}

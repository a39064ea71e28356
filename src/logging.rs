//! Build log capability and output sinks
//!
//! The orchestrator reports progress through a [`Logger`] supplied by the
//! caller. Child process output is routed through [`LogWriter`], and stderr
//! is duplicated with [`FanOutWriter`] so it can be attached to errors.

use std::fmt;
use std::io::{self, Write};
use tracing::info;

/// Minimal print-style logging capability injected into every component
pub trait Logger: Send + Sync {
    /// Print a message as-is
    fn print(&self, msg: &str);

    /// Print a message as one line
    fn println(&self, line: &str);

    /// Print preformatted arguments, usually from `format_args!`
    fn printf(&self, args: fmt::Arguments<'_>) {
        self.println(&args.to_string());
    }
}

/// Logger that forwards everything to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn print(&self, msg: &str) {
        let msg = msg.trim_end_matches('\n');
        if !msg.is_empty() {
            info!("{}", msg);
        }
    }

    fn println(&self, line: &str) {
        info!("{}", line);
    }
}

/// Adapts a [`Logger`] into an `io::Write` sink
pub struct LogWriter<'a> {
    logger: &'a dyn Logger,
}

impl<'a> LogWriter<'a> {
    pub fn new(logger: &'a dyn Logger) -> Self {
        Self { logger }
    }
}

impl Write for LogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.logger.print(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that forwards each write to every sink in order
///
/// Stops at the first sink that fails; later sinks do not see that write.
pub struct FanOutWriter<'a> {
    sinks: Vec<&'a mut (dyn Write + Send)>,
}

impl<'a> FanOutWriter<'a> {
    pub fn new(sinks: Vec<&'a mut (dyn Write + Send)>) -> Self {
        Self { sinks }
    }
}

impl Write for FanOutWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in self.sinks.iter_mut() {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Logger;
    use std::sync::Mutex;

    /// Logger that records every message for assertions
    #[derive(Default)]
    pub struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.lines().iter().any(|l| l.contains(needle))
        }
    }

    impl Logger for RecordingLogger {
        fn print(&self, msg: &str) {
            self.lines.lock().unwrap().push(msg.to_string());
        }

        fn println(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_writer_forwards_text() {
        let logger = RecordingLogger::default();
        let mut writer = LogWriter::new(&logger);
        writer.write_all(b"compiling linux/amd64\n").unwrap();
        assert_eq!(logger.lines(), vec!["compiling linux/amd64\n"]);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let mut first: Vec<u8> = Vec::new();
        let mut second: Vec<u8> = Vec::new();
        {
            let sinks = vec![
                &mut first as &mut (dyn Write + Send),
                &mut second as &mut (dyn Write + Send),
            ];
            let mut fan = FanOutWriter::new(sinks);
            fan.write_all(b"cgo: exec gcc").unwrap();
        }
        assert_eq!(first, b"cgo: exec gcc");
        assert_eq!(second, b"cgo: exec gcc");
    }

    #[test]
    fn fan_out_stops_at_first_failure() {
        let mut failing = FailingSink;
        let mut after: Vec<u8> = Vec::new();
        let result = {
            let sinks = vec![
                &mut failing as &mut (dyn Write + Send),
                &mut after as &mut (dyn Write + Send),
            ];
            let mut fan = FanOutWriter::new(sinks);
            fan.write(b"lost")
        };
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(after.is_empty());
    }

    #[test]
    fn printf_goes_through_println() {
        let logger = RecordingLogger::default();
        logger.printf(format_args!("INFO: Starting {}/{}", "crossgo", 3));
        assert_eq!(logger.lines(), vec!["INFO: Starting crossgo/3"]);
    }
}

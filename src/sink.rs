// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of diaglog.
//
// diaglog is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// diaglog is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with diaglog.  If not,
// see <http://www.gnu.org/licenses/>.

//! Serializing log messages onto a byte stream.
//!
//! [`StreamSink`] is an [`Observer`] that renders each message it receives as one line:
//!
//! ```text
//! <indicator> TAB <message text> CR LF
//! ```
//!
//! and finalizes the write after every line, so that each message is immediately visible to
//! whoever is reading the stream. The indicator is a short token identifying the [`Severity`]
//! (see [`Indicators`]). When constructed, the sink writes a single bare `CR LF` to announce
//! itself; consumers should skip it.
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use diaglog::{Dispatcher, Log, Severity};
//! use diaglog::sink::StreamSink;
//! use diaglog::stream::{PacketBuffer, Readable};
//!
//! let dispatcher = Dispatcher::new();
//! let buf = Rc::new(PacketBuffer::new());
//! let sink = Rc::new(StreamSink::new(buf.clone()));
//! let _reg = dispatcher.register(&sink);
//!
//! buf.read_finalize(); // discard the start-up line
//! Log::with_label(&dispatcher, Severity::Error, "MsgD").write(0x1234u16);
//! assert_eq!(buf.read_str(), "ERR\tMsgD = 0x1234\r\n");
//! ```

use crate::{
    dispatch::Observer,
    error::Result,
    severity::Severity,
    stream::{IoWriter, Writeable},
};

/// Per-severity tokens written at the start of each line.
///
/// Tokens must not contain TAB, CR or LF; readers locate the message text by scanning for the
/// first TAB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indicators {
    tokens: [&'static str; 5],
}

impl Indicators {
    pub const fn new(
        debug: &'static str,
        info: &'static str,
        warning: &'static str,
        error: &'static str,
        critical: &'static str,
    ) -> Indicators {
        Indicators {
            tokens: [debug, info, warning, error, critical],
        }
    }
    /// Single-glyph indicators, for consoles that render them
    pub const fn emoji() -> Indicators {
        Indicators::new("🐛", "💬", "⚠", "❌", "🔥")
    }
    pub fn get(&self, severity: Severity) -> &'static str {
        self.tokens[severity.index()]
    }
    /// Replace the token for a single severity
    pub fn with(mut self, severity: Severity, token: &'static str) -> Indicators {
        self.tokens[severity.index()] = token;
        self
    }
}

impl std::default::Default for Indicators {
    /// `DBG`, `INF`, `WRN`, `ERR` & `CRT`
    fn default() -> Self {
        Indicators::new("DBG", "INF", "WRN", "ERR", "CRT")
    }
}

/// An [`Observer`] writing one line per message to a [`Writeable`].
///
/// The stream is owned elsewhere; pass a shared handle such as `Rc<PacketBuffer>` (or `&T` when
/// the sink won't be registered with a [`Dispatcher`]).
///
/// [`Dispatcher`]: crate::dispatch::Dispatcher
pub struct StreamSink<S: Writeable> {
    stream: S,
    indicators: Indicators,
}

impl<S: Writeable> StreamSink<S> {
    /// Construct a sink with the default [`Indicators`]; writes the start-up line immediately.
    pub fn new(stream: S) -> StreamSink<S> {
        StreamSink::builder(stream).build()
    }
    pub fn builder(stream: S) -> StreamSinkBuilder<S> {
        StreamSinkBuilder {
            stream,
            indicators: Indicators::default(),
        }
    }
    pub fn stream(&self) -> &S {
        &self.stream
    }
    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }
    pub fn into_stream(self) -> S {
        self.stream
    }
    fn heartbeat(&self) -> Result<()> {
        self.stream.write_bytes(b"\r\n")?;
        self.stream.write_finalize()
    }
    fn write_line(&self, severity: Severity, text: &str) -> Result<()> {
        self.stream
            .write_bytes(self.indicators.get(severity).as_bytes())?;
        self.stream.write_bytes(b"\t")?;
        self.stream.write_bytes(text.as_bytes())?;
        self.stream.write_bytes(b"\r\n")?;
        self.stream.write_finalize()
    }
}

impl StreamSink<IoWriter<std::io::Stdout>> {
    /// A sink writing to this process' standard output
    pub fn stdout() -> StreamSink<IoWriter<std::io::Stdout>> {
        StreamSink::new(IoWriter::stdout())
    }
}

impl<S: Writeable> Observer for StreamSink<S> {
    fn receive(&self, severity: Severity, text: &str) {
        self.write_line(severity, text).unwrap_or_else(|err| {
            // Never leave half a line behind to be glued onto the next one
            self.stream.write_abort();
            tracing::error!("diaglog stream sink dropped a message: {}", err);
        })
    }
}

/// Configures a [`StreamSink`]; the start-up line is written by [`StreamSinkBuilder::build`].
pub struct StreamSinkBuilder<S: Writeable> {
    stream: S,
    indicators: Indicators,
}

impl<S: Writeable> StreamSinkBuilder<S> {
    pub fn indicators(mut self, indicators: Indicators) -> Self {
        self.indicators = indicators;
        self
    }
    pub fn indicator(mut self, severity: Severity, token: &'static str) -> Self {
        self.indicators = self.indicators.with(severity, token);
        self
    }
    pub fn build(self) -> StreamSink<S> {
        let sink = StreamSink {
            stream: self.stream,
            indicators: self.indicators,
        };
        sink.heartbeat().unwrap_or_else(|err| {
            sink.stream.write_abort();
            tracing::error!("diaglog stream sink failed to start: {}", err);
        });
        sink
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dispatch::Dispatcher,
        log::Log,
        stream::{PacketBuffer, Readable},
    };

    use std::rc::Rc;

    const MSG_D_BYTES: [u8; 8] = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];

    /// Skip the indicator & the TAB, read the rest of the line & strip the CR LF
    fn next_line(src: &PacketBuffer) -> String {
        while src.get_read_ready() > 0 && src.read_u8() != Some(b'\t') {}
        let line = src.read_str();
        assert!(line.len() > 2);
        assert!(line.ends_with("\r\n"));
        line[..line.len() - 2].to_string()
    }

    #[test]
    fn test_heartbeat() {
        let buf = PacketBuffer::new();
        let _sink = StreamSink::new(&buf);
        assert_eq!(buf.packets(), 1);
        assert_eq!(buf.read_str(), "\r\n");
    }

    #[test]
    fn test_lines() {
        let dispatcher = Dispatcher::new();
        let buf = Rc::new(PacketBuffer::new());
        let sink = Rc::new(StreamSink::new(buf.clone()));
        let _reg = dispatcher.register(&sink);

        // Discard the start-up line
        assert!(buf.get_read_ready() > 0);
        buf.read_finalize();

        Log::new(&dispatcher, Severity::Debug)
            .write("MsgA")
            .write(0x12u8);
        Log::with_label(&dispatcher, Severity::Info, "MsgB").write(0x1234u16);
        Log::with_label(&dispatcher, Severity::Warning, "MsgC").write(0x12345678u32);
        Log::with_label(&dispatcher, Severity::Error, "MsgD").write(&MSG_D_BYTES);
        Log::with_labels(&dispatcher, Severity::Critical, "MsgE", "Test1234")
            .write(0x1234567890ABCDEFu64);

        assert_eq!(buf.packets(), 5);
        assert_eq!(next_line(&buf), "MsgA = 0x12");
        assert_eq!(next_line(&buf), "MsgB = 0x1234");
        assert_eq!(next_line(&buf), "MsgC = 0x12345678");
        assert_eq!(next_line(&buf), "MsgD = 0x123456789ABCDEF0");
        assert_eq!(next_line(&buf), "MsgE: Test1234 = 0x1234567890ABCDEF");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_wire_format() {
        let buf = PacketBuffer::new();
        let sink = StreamSink::new(&buf);
        buf.read_finalize();
        sink.receive(Severity::Error, "MsgD = 0x123456789ABCDEF0");
        assert_eq!(buf.read_str(), "ERR\tMsgD = 0x123456789ABCDEF0\r\n");
        // ... and that was the only line
        assert_eq!(buf.packets(), 0);
    }

    #[test]
    fn test_indicators() {
        let buf = PacketBuffer::new();
        let sink = StreamSink::builder(&buf)
            .indicators(Indicators::emoji())
            .indicator(Severity::Info, "i")
            .build();
        buf.read_finalize();
        for severity in Severity::ALL {
            sink.receive(severity, "x");
        }
        let lines: Vec<String> = (0..5).map(|_| buf.read_str()).collect();
        assert_eq!(lines[1], "i\tx\r\n");
        assert_eq!(lines[4], "🔥\tx\r\n");
        // every severity is distinguishable
        for (i, a) in Severity::ALL.iter().enumerate() {
            for b in &Severity::ALL[i + 1..] {
                assert_ne!(sink.indicators().get(*a), sink.indicators().get(*b));
            }
        }
        let d = Indicators::default();
        assert!(Severity::ALL.iter().all(|s| !d.get(*s).contains('\t')));
    }

    #[test]
    fn test_full_stream() {
        // Room for the start-up line & a little more, but never a whole message
        let buf = PacketBuffer::with_capacity(8);
        let sink = StreamSink::new(&buf);
        buf.read_finalize();
        sink.receive(Severity::Info, "much too long for this buffer");
        assert_eq!(buf.get_read_ready(), 0);
        assert_eq!(buf.packets(), 0);
        // A short message still goes through afterwards
        sink.receive(Severity::Info, "ok");
        assert_eq!(buf.read_str(), "INF\tok\r\n");
    }

    #[test]
    fn test_io_writer_sink() {
        let sink = StreamSink::new(IoWriter::new(Vec::new()));
        sink.receive(Severity::Warning, "MsgG: Var1 = 0");
        let bytes = sink.into_stream().into_inner();
        assert_eq!(bytes, b"\r\nWRN\tMsgG: Var1 = 0\r\n".to_vec());
    }

    /// Refuses exactly one `write` call (the `fail_on`th, counting from one), accepting all others
    struct Flaky {
        out: Vec<u8>,
        calls: usize,
        fail_on: usize,
    }

    impl std::io::Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WouldBlock,
                    "try again",
                ));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_partial_line() {
        // Call #1 is the heartbeat, call #2 carries the whole of the first line
        let sink = StreamSink::new(IoWriter::new(Flaky {
            out: Vec::new(),
            calls: 0,
            fail_on: 2,
        }));
        sink.receive(Severity::Error, "first");
        sink.receive(Severity::Info, "second");
        let flaky = sink.into_stream().into_inner();
        assert_eq!(flaky.out, b"\r\nINF\tsecond\r\n".to_vec());
    }
}

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

//! Assembling a log message.
//!
//! A [`Log`] is a single message under construction: a [`Severity`], plus up to `N` bytes of text
//! (by default [`MAXLEN`]). Fragments are appended with a chain of [`Log::write`] &
//! [`Log::write_decimal`] calls; when the [`Log`] goes out of scope (or [`Log::finalize`] is
//! called) the message is handed to the [`Dispatcher`] it was opened against. That happens exactly
//! once, on every exit path.
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use diaglog::{Dispatcher, Log, Severity};
//! use diaglog::observer::Recorder;
//!
//! let dispatcher = Dispatcher::new();
//! let recorder = Rc::new(Recorder::new());
//! let _reg = dispatcher.register(&recorder);
//!
//! Log::with_label(&dispatcher, Severity::Warning, "MsgG")
//!     .write(": Var1").write_decimal(0u32)
//!     .write(", Var2").write_decimal(80u32);
//!
//! let event = recorder.pop().unwrap();
//! assert_eq!(event.severity, Severity::Warning);
//! assert_eq!(event.text, "MsgG: Var1 = 0, Var2 = 80");
//! ```

use crate::{
    dispatch::Dispatcher,
    format::{append_hex_bytes, Decimal, Loggable, MessageBuf, MAXLEN},
    severity::Severity,
};

/// A message under construction; delivered to its [`Dispatcher`] when finalized or dropped.
///
/// Writes never fail. Text that doesn't fit is truncated (see [`format`](crate::format)), and
/// writes to a finalized message are ignored.
pub struct Log<'d, const N: usize = MAXLEN> {
    dispatcher: &'d Dispatcher,
    severity: Severity,
    buf: MessageBuf<N>,
    finalized: bool,
}

impl<'d> Log<'d> {
    /// Open an empty message
    pub fn new(dispatcher: &'d Dispatcher, severity: Severity) -> Log<'d> {
        Log::start(dispatcher, severity, &[])
    }
    /// Open a message beginning with `label`
    pub fn with_label(dispatcher: &'d Dispatcher, severity: Severity, label: &str) -> Log<'d> {
        Log::start(dispatcher, severity, &[label])
    }
    /// Open a message beginning with `label`, `": "`, then `sublabel`
    pub fn with_labels(
        dispatcher: &'d Dispatcher,
        severity: Severity,
        label: &str,
        sublabel: &str,
    ) -> Log<'d> {
        Log::start(dispatcher, severity, &[label, sublabel])
    }
}

impl<'d, const N: usize> Log<'d, N> {
    /// Open a message of capacity `N`, seeded with `labels` joined by `": "`
    ///
    /// ```rust
    /// # use diaglog::{Dispatcher, Log, Severity};
    /// let dispatcher = Dispatcher::new();
    /// let mut log = Log::<16>::start(&dispatcher, Severity::Info, &["Short", "buffer"]);
    /// log.write(" that overflows");
    /// assert_eq!(log.as_str(), "Short: buffer th");
    /// ```
    pub fn start(dispatcher: &'d Dispatcher, severity: Severity, labels: &[&str]) -> Log<'d, N> {
        let mut buf = MessageBuf::new();
        for (i, label) in labels.iter().enumerate() {
            if i > 0 {
                buf.push_str(": ");
            }
            buf.push_str(label);
        }
        Log {
            dispatcher,
            severity,
            buf,
            finalized: false,
        }
    }
    /// Append `value`, formatted according to its kind; integers are rendered in hex.
    pub fn write<T: Loggable>(&mut self, value: T) -> &mut Self {
        if !self.finalized {
            value.append_to(&mut self.buf);
        }
        self
    }
    /// Append `bytes` as a hex string
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        if !self.finalized {
            append_hex_bytes(&mut self.buf, bytes);
        }
        self
    }
    /// Append an integer in decimal; signed types always carry a sign.
    pub fn write_decimal<T: Decimal>(&mut self, value: T) -> &mut Self {
        if !self.finalized {
            value.append_decimal(&mut self.buf);
        }
        self
    }
    /// Append pre-formatted arguments, e.g. `log.write_args(format_args!("{:>4}", x))`
    pub fn write_args(&mut self, args: std::fmt::Arguments<'_>) -> &mut Self {
        if !self.finalized {
            // `MessageBuf` absorbs overflow, so this can't fail
            let _ = std::fmt::Write::write_fmt(&mut self.buf, args);
        }
        self
    }
    /// Deliver the message. Only the first call has any effect.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        self.dispatcher.dispatch(self.severity, self.buf.as_str());
    }
    pub fn severity(&self) -> Severity {
        self.severity
    }
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }
    pub fn is_truncated(&self) -> bool {
        self.buf.is_truncated()
    }
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl<'d, const N: usize> Drop for Log<'d, N> {
    fn drop(&mut self) {
        self.finalize()
    }
}

impl<'d, const N: usize> std::fmt::Debug for Log<'d, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("severity", &self.severity)
            .field("text", &self.as_str())
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Dispatcher {
    /// Open a message against this dispatcher
    pub fn log(&self, severity: Severity, label: &str) -> Log<'_> {
        Log::with_label(self, severity, label)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observer::{Event, Recorder};

    use std::rc::Rc;

    const MSG_D_BYTES: [u8; 8] = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];

    fn check_next(rec: &Recorder, severity: Severity, text: &str) {
        let event = rec.pop().expect("no message was delivered");
        assert_eq!(
            event,
            Event {
                severity,
                text: text.to_string()
            }
        );
    }

    #[test]
    fn test_basic() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        Log::with_label(&dispatcher, Severity::Debug, "MsgA").write(0x12u8);
        Log::with_label(&dispatcher, Severity::Info, "MsgB").write(0x1234u16);
        Log::with_label(&dispatcher, Severity::Warning, "MsgC").write(0x12345678u32);
        Log::with_label(&dispatcher, Severity::Error, "MsgD").write_bytes(&MSG_D_BYTES);
        Log::with_labels(&dispatcher, Severity::Critical, "MsgE", "Test1234")
            .write(0x1234567890ABCDEFu64);

        // A longer chain of writes
        Log::with_label(&dispatcher, Severity::Info, "MsgF")
            .write(": Var1")
            .write(true)
            .write(", Var2")
            .write(false)
            .write(", Var3")
            .write(0x4321u16);

        // Decimal formatting
        Log::with_label(&dispatcher, Severity::Warning, "MsgG")
            .write(": Var1")
            .write_decimal(0u32)
            .write(", Var2")
            .write_decimal(80u32)
            .write(", Var3")
            .write_decimal(u32::MAX);

        // Signed decimal formatting
        Log::with_label(&dispatcher, Severity::Warning, "MsgH")
            .write(": Var1")
            .write_decimal(0i32)
            .write(", Var2")
            .write_decimal(i32::MIN)
            .write(", Var3")
            .write_decimal(i32::MAX);

        check_next(&rec, Severity::Debug, "MsgA = 0x12");
        check_next(&rec, Severity::Info, "MsgB = 0x1234");
        check_next(&rec, Severity::Warning, "MsgC = 0x12345678");
        check_next(&rec, Severity::Error, "MsgD = 0x123456789ABCDEF0");
        check_next(&rec, Severity::Critical, "MsgE: Test1234 = 0x1234567890ABCDEF");
        check_next(&rec, Severity::Info, "MsgF: Var1 = 1, Var2 = 0, Var3 = 0x4321");
        check_next(&rec, Severity::Warning, "MsgG: Var1 = 0, Var2 = 80, Var3 = 4294967295");
        check_next(
            &rec,
            Severity::Warning,
            "MsgH: Var1 = +0, Var2 = -2147483648, Var3 = +2147483647",
        );
        assert!(rec.is_empty());
    }

    #[test]
    fn test_overflow() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        // Construct & truncate the reference message
        let mut reference = String::from("Overflow: ");
        while reference.len() < MAXLEN {
            reference.push_str("Test");
        }
        reference.truncate(MAXLEN);

        {
            let mut log = Log::with_label(&dispatcher, Severity::Debug, "Overflow: ");
            for _ in 0..MAXLEN / 4 {
                log.write("Test");
            }
            assert!(log.is_truncated());
            assert_eq!(log.len(), MAXLEN);
            // Further writes change nothing
            log.write(0xFFu8).write_decimal(-1i8).write(true);
            assert_eq!(log.len(), MAXLEN);
        }

        check_next(&rec, Severity::Debug, &reference);
    }

    #[test]
    fn test_labels_count_against_capacity() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        Log::<8>::start(&dispatcher, Severity::Info, &["Label", "Sublabel"]).write(1u8);
        check_next(&rec, Severity::Info, "Label: S");
    }

    #[test]
    fn test_finalize_once() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        let mut log = dispatcher.log(Severity::Error, "Once");
        assert!(!log.is_finalized());
        log.finalize();
        assert!(log.is_finalized());
        log.write(" more"); // ignored
        log.finalize(); // no-op
        drop(log); // ...as is the implicit finalize
        check_next(&rec, Severity::Error, "Once");
        assert!(rec.is_empty());
    }

    #[test]
    fn test_no_observers() {
        let dispatcher = Dispatcher::new();
        Log::new(&dispatcher, Severity::Critical).write("into the void");
    }

    #[test]
    fn test_finalize_on_early_return() {
        fn bail(dispatcher: &Dispatcher, fail: bool) -> Option<u32> {
            let mut log = Log::with_label(dispatcher, Severity::Warning, "bail");
            if fail {
                log.write(": early");
                return None;
            }
            log.write(": late");
            Some(1)
        }

        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);
        assert!(bail(&dispatcher, true).is_none());
        assert!(bail(&dispatcher, false).is_some());
        check_next(&rec, Severity::Warning, "bail: early");
        check_next(&rec, Severity::Warning, "bail: late");
    }

    #[test]
    fn test_write_args_and_empty() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        let log = Log::new(&dispatcher, Severity::Debug);
        assert!(log.is_empty());
        assert_eq!(log.severity(), Severity::Debug);
        drop(log);
        check_next(&rec, Severity::Debug, "");

        Log::with_label(&dispatcher, Severity::Info, "args")
            .write_args(format_args!(": {:>4}|{:.2}", 7, 1.5f32));
        check_next(&rec, Severity::Info, "args:    7|1.50");
    }

    #[test]
    fn test_multibyte_truncation() {
        let dispatcher = Dispatcher::new();
        let rec = Rc::new(Recorder::new());
        let _reg = dispatcher.register(&rec);

        // "世界" is six bytes; only one whole character fits
        Log::<5>::start(&dispatcher, Severity::Info, &["ab"])
            .write("世界")
            .write("c");
        check_next(&rec, Severity::Info, "ab世");
    }
}

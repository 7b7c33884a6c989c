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
//! Fixed-capacity diagnostic logging with synchronous observers
//!
//! # Introduction
//!
//! [diaglog](crate) is a small logging facility for software that can't (or would rather not)
//! allocate on its logging path: firmware, real-time loops, interrupt-adjacent code. A message is
//! assembled in place, in a buffer of fixed capacity, by chaining "append" calls; when the message
//! goes out of scope it is delivered, synchronously & on the caller's thread, to every
//! [`Observer`] registered with the [`Dispatcher`] it was opened against.
//!
//! There are three pieces:
//!
//! 1. assembling a message: [`Log`], with the formatting rules in [`format`]
//!
//! 2. fanning it out: [`Dispatcher`] & the [`Observer`] trait
//!
//! 3. doing something with it: a [`Recorder`] for tests, a [`TracingObserver`] bridging to the
//!    [`tracing`] ecosystem, or a [`StreamSink`] writing delimited lines to a byte stream
//!
//! [`Recorder`]: crate::observer::Recorder
//! [`TracingObserver`]: crate::observer::TracingObserver
//! [`StreamSink`]: crate::sink::StreamSink
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! # Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use diaglog::{Dispatcher, Log, Severity};
//! use diaglog::sink::StreamSink;
//! use diaglog::stream::{PacketBuffer, Readable};
//!
//! let dispatcher = Dispatcher::new();
//! let console = Rc::new(PacketBuffer::new());
//! let sink = Rc::new(StreamSink::new(console.clone()));
//! let _registration = dispatcher.register(&sink);
//! console.read_finalize(); // the sink announces itself with an empty line
//!
//! // Integers are written in hex, unless asked for in decimal:
//! Log::with_label(&dispatcher, Severity::Info, "Link up")
//!     .write(": port").write_decimal(3u8)
//!     .write(", status").write(0x01A4u16);
//!
//! assert_eq!(console.read_str(), "INF\tLink up: port = 3, status = 0x01A4\r\n");
//! ```
//!
//! Messages never fail to log: text beyond the buffer's capacity ([`MAXLEN`] bytes unless the
//! call site picks its own) is silently dropped, & a [`Dispatcher`] with no observers simply
//! discards what it's given.
//!
//! # Threading
//!
//! Everything here is single-threaded: [`Dispatcher`] is neither `Send` nor `Sync`. Callers logging
//! from more than one execution context must serialize access to the dispatcher themselves.

pub mod dispatch;
pub mod error;
pub mod format;
pub mod log;
pub mod observer;
pub mod severity;
pub mod sink;
pub mod stream;

pub use crate::{
    dispatch::{Dispatcher, Observer, Registration},
    format::MAXLEN,
    log::Log,
    severity::Severity,
};

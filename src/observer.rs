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
//! [`Observer`] implementations that don't need a byte stream.
//!
//! - [`Recorder`] queues every message in memory, for inspection by tests
//! - [`TracingObserver`] re-emits every message as a [`tracing`] [`Event`], handing it to whatever
//!   [`Subscriber`] is installed
//!
//! The stream-serializing observer lives in [`sink`](crate::sink).
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [`Subscriber`]: https://docs.rs/tracing/0.1.34/tracing/trait.Subscriber.html

use crate::{dispatch::Observer, severity::Severity};

use std::{cell::RefCell, collections::VecDeque};

/// One finalized message, as seen by a [`Recorder`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub text: String,
}

/// An [`Observer`] that records messages into a FIFO queue.
#[derive(Debug, Default)]
pub struct Recorder {
    queue: RefCell<VecDeque<Event>>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }
    /// Remove & return the oldest recorded message
    pub fn pop(&self) -> Option<Event> {
        self.queue.borrow_mut().pop_front()
    }
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
    pub fn clear(&self) {
        self.queue.borrow_mut().clear()
    }
    /// A copy of everything recorded so far, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.queue.borrow().iter().cloned().collect()
    }
}

impl Observer for Recorder {
    fn receive(&self, severity: Severity, text: &str) {
        self.queue.borrow_mut().push_back(Event {
            severity,
            text: text.to_string(),
        });
    }
}

/// Map a [`Severity`] to the [`tracing::Level`] used by [`TracingObserver`].
///
/// [`tracing`] has no level above `ERROR`, so [`Severity::Critical`] shares it with
/// [`Severity::Error`] (the `severity` field on the emitted event preserves the distinction).
pub fn tracing_level(severity: Severity) -> tracing::Level {
    match severity {
        Severity::Debug => tracing::Level::DEBUG,
        Severity::Info => tracing::Level::INFO,
        Severity::Warning => tracing::Level::WARN,
        Severity::Error | Severity::Critical => tracing::Level::ERROR,
    }
}

/// An [`Observer`] that forwards every message to [`tracing`], under the target `diaglog`.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn receive(&self, severity: Severity, text: &str) {
        // The level given to `event!()` has to be a constant, so this can't just call
        // `tracing_level()`; keep the two matches in agreement.
        match severity {
            Severity::Debug => {
                tracing::event!(target: "diaglog", tracing::Level::DEBUG, severity = %severity, "{}", text)
            }
            Severity::Info => {
                tracing::event!(target: "diaglog", tracing::Level::INFO, severity = %severity, "{}", text)
            }
            Severity::Warning => {
                tracing::event!(target: "diaglog", tracing::Level::WARN, severity = %severity, "{}", text)
            }
            Severity::Error | Severity::Critical => {
                tracing::event!(target: "diaglog", tracing::Level::ERROR, severity = %severity, "{}", text)
            }
        }
    }
}

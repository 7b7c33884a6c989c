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
//! [diaglog](crate) errors
//!
//! Assembling & dispatching a message never fails; the only fallible operations in this crate are
//! those of the byte-stream capability in [`stream`](crate::stream). [`StreamSink`] swallows these
//! (after reporting them via [`tracing`]), but callers driving a [`Writeable`] directly see them.
//!
//! [`StreamSink`]: crate::sink::StreamSink
//! [`Writeable`]: crate::stream::Writeable
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

use backtrace::Backtrace;

/// [diaglog](crate) error type
///
/// [diaglog](crate) eschews libraries like [thiserror] & [anyhow] in favor of a straightforward
/// enumeration with a few match arms chosen on the basis what the caller will need to respond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
#[non_exhaustive]
pub enum Error {
    /// The in-memory stream has no room for the bytes being written
    BufferFull { capacity: usize, back: Backtrace },
    /// An underlying [`std::io::Write`] implementation failed
    Io {
        source: std::io::Error,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BufferFull { capacity, .. } => write!(
                f,
                "Stream buffer is full ({} bytes); the write was discarded",
                capacity
            ),
            Error::Io { source, .. } => write!(f, "While writing to the stream, got {}", source),
            _ => write!(f, "Other diaglog error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BufferFull { capacity: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Io { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            _ => write!(f, "{}", self),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            source: err,
            back: Backtrace::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

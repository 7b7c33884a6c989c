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
//! Message severities.
//!
//! [`Severity`] is a small, ranked enumeration. The only contract callers may rely upon is the
//! ordering: `Debug < Info < Warning < Error < Critical`. The discriminants are signed so that
//! "zero" sits at [`Severity::Warning`], leaving room on either side should intermediate levels
//! ever be needed.

type StdResult<T, E> = std::result::Result<T, E>;

/// How urgent a log message is, from least to most severe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum Severity {
    /// diagnostic chatter, of interest only while debugging
    Debug = -20,
    /// normal, but noteworthy, operation
    Info = -10,
    /// something unexpected happened but operation continues
    Warning = 0,
    /// an operation failed
    Error = 10,
    /// the system may no longer be able to function
    Critical = 20,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// The signed numeric encoding of this severity.
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Position of this severity in [`Severity::ALL`].
    pub(crate) const fn index(self) -> usize {
        match self {
            Severity::Debug => 0,
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
            Severity::Critical => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Severity::Debug => "DEBUG",
                Severity::Info => "INFO",
                Severity::Warning => "WARNING",
                Severity::Error => "ERROR",
                Severity::Critical => "CRITICAL",
            }
        )
    }
}

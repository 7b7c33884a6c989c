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

//! Log a handful of messages to stdout, and mirror them to stderr via `tracing`.

use diaglog::{
    observer::{tracing_level, TracingObserver},
    sink::{Indicators, StreamSink},
    stream::IoWriter,
    Dispatcher, Log, Severity,
};
use tracing_subscriber::{
    filter::LevelFilter,
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::rc::Rc;

pub fn main() {
    // Setup the real subscriber; the stderr mirror skips debug chatter...
    let subscriber = Registry::default()
        .with(LevelFilter::from_level(tracing_level(Severity::Info)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    let dispatcher = Dispatcher::new();
    let console = Rc::new(
        StreamSink::builder(IoWriter::stdout())
            .indicators(Indicators::emoji())
            .build(),
    );
    let mirror = Rc::new(TracingObserver);
    let _console = dispatcher.register(&console);
    let _mirror = dispatcher.register(&mirror);

    let payload = [0xDEu8, 0xAD, 0xBE, 0xEF];

    Log::with_label(&dispatcher, Severity::Debug, "Boot").write(": stage").write_decimal(1u8);
    Log::with_label(&dispatcher, Severity::Info, "Link up")
        .write(": port")
        .write_decimal(3u8)
        .write(", status")
        .write(0x01A4u16);
    Log::with_labels(&dispatcher, Severity::Warning, "Sensor", "temperature")
        .write_decimal(-40i16);
    Log::with_label(&dispatcher, Severity::Error, "Bad frame").write(&payload);
    Log::with_labels(&dispatcher, Severity::Critical, "Watchdog", "你好").write(true);
}

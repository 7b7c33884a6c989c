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

//! Stream log lines to a TCP listener, e.g. `nc -l 5514`.

use diaglog::{sink::StreamSink, stream::IoWriter, Dispatcher, Log, Severity};

use std::{net::TcpStream, rc::Rc};

pub fn main() {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:5514".to_string());
    let socket = TcpStream::connect(&addr).unwrap();

    let dispatcher = Dispatcher::new();
    let sink = Rc::new(StreamSink::new(IoWriter::new(socket)));
    let _reg = dispatcher.register(&sink);

    for severity in Severity::ALL {
        Log::with_labels(&dispatcher, severity, "你好", "TCP socket")
            .write(", level")
            .write_decimal(severity.as_i8());
    }
}

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

//! The byte-stream capability.
//!
//! [`StreamSink`] doesn't care where its bytes go; it only needs something that can accept bytes
//! & be told "this write is complete, make it visible". This module defines that contract
//! ([`Writeable`]), its reading counterpart ([`Readable`]) & two implementations:
//!
//! - [`PacketBuffer`]: an in-memory, packet-oriented buffer; each finalized write becomes one
//!   packet that a reader consumes (& then discards) as a unit
//! - [`IoWriter`]: anything implementing [`std::io::Write`] (stdout, a [`TcpStream`], a file...)
//!
//! [`StreamSink`]: crate::sink::StreamSink
//! [`TcpStream`]: std::net::TcpStream
//!
//! # Examples
//!
//! ```rust
//! use diaglog::stream::{PacketBuffer, Readable, Writeable};
//!
//! let buf = PacketBuffer::new();
//! buf.write_bytes(b"Hello, ").unwrap();
//! buf.write_bytes(b"world!").unwrap();
//! assert_eq!(buf.get_read_ready(), 0); // nothing visible until the write is finalized
//! buf.write_finalize().unwrap();
//! assert_eq!(buf.read_str(), "Hello, world!");
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::{Buf, BufMut, BytesMut};

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          capabilities                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations a byte sink must support.
///
/// Methods take `&self`: a sink is typically shared between its owner & an observer, so
/// implementations are expected to use interior mutability (as [`std::io::Write`] is implemented
/// for `&TcpStream`).
pub trait Writeable {
    /// Append `src` to the write in progress.
    fn write_bytes(&self, src: &[u8]) -> Result<()>;
    /// Complete the write in progress, making it visible to readers.
    fn write_finalize(&self) -> Result<()>;
    /// Discard the write in progress, if the implementation can.
    fn write_abort(&self) {}
}

/// Operations a byte source must support.
pub trait Readable {
    /// Number of bytes that may be read from the current packet
    fn get_read_ready(&self) -> usize;
    /// Read one byte from the current packet
    fn read_u8(&self) -> Option<u8>;
    /// Discard the remainder of the current packet & move on to the next
    fn read_finalize(&self);
    /// Read the remainder of the current packet as (lossily decoded) UTF-8, then finalize the read
    fn read_str(&self) -> String {
        let mut buf = Vec::with_capacity(self.get_read_ready());
        while self.get_read_ready() > 0 {
            match self.read_u8() {
                Some(b) => buf.push(b),
                None => break,
            }
        }
        self.read_finalize();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<T: Writeable + ?Sized> Writeable for &T {
    fn write_bytes(&self, src: &[u8]) -> Result<()> {
        (**self).write_bytes(src)
    }
    fn write_finalize(&self) -> Result<()> {
        (**self).write_finalize()
    }
    fn write_abort(&self) {
        (**self).write_abort()
    }
}

impl<T: Writeable + ?Sized> Writeable for Rc<T> {
    fn write_bytes(&self, src: &[u8]) -> Result<()> {
        (**self).write_bytes(src)
    }
    fn write_finalize(&self) -> Result<()> {
        (**self).write_finalize()
    }
    fn write_abort(&self) {
        (**self).write_abort()
    }
}

impl<T: Readable + ?Sized> Readable for &T {
    fn get_read_ready(&self) -> usize {
        (**self).get_read_ready()
    }
    fn read_u8(&self) -> Option<u8> {
        (**self).read_u8()
    }
    fn read_finalize(&self) {
        (**self).read_finalize()
    }
}

impl<T: Readable + ?Sized> Readable for Rc<T> {
    fn get_read_ready(&self) -> usize {
        (**self).get_read_ready()
    }
    fn read_u8(&self) -> Option<u8> {
        (**self).read_u8()
    }
    fn read_finalize(&self) {
        (**self).read_finalize()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       struct PacketBuffer                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default)]
struct Packets {
    /// committed packets, back-to-back
    data: BytesMut,
    /// unread length of each committed packet; the front is the packet being read
    lengths: VecDeque<usize>,
    /// the write in progress
    pending: BytesMut,
}

/// An in-memory [`Writeable`] + [`Readable`] that preserves write boundaries.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    packets: RefCell<Packets>,
    capacity: Option<usize>,
}

impl PacketBuffer {
    /// An unbounded buffer
    pub fn new() -> PacketBuffer {
        PacketBuffer::default()
    }
    /// A buffer that will hold at most `capacity` bytes (committed & pending combined); writes
    /// beyond that fail with [`Error::BufferFull`].
    pub fn with_capacity(capacity: usize) -> PacketBuffer {
        PacketBuffer {
            packets: RefCell::new(Packets {
                data: BytesMut::with_capacity(capacity),
                ..Packets::default()
            }),
            capacity: Some(capacity),
        }
    }
    /// Number of committed, not yet discarded, packets
    pub fn packets(&self) -> usize {
        self.packets.borrow().lengths.len()
    }
    /// Number of committed, unread bytes across all packets
    pub fn len(&self) -> usize {
        self.packets.borrow().data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.packets.borrow().data.is_empty()
    }
}

impl Writeable for PacketBuffer {
    fn write_bytes(&self, src: &[u8]) -> Result<()> {
        let mut packets = self.packets.borrow_mut();
        if let Some(capacity) = self.capacity {
            if packets.data.len() + packets.pending.len() + src.len() > capacity {
                return Err(Error::BufferFull {
                    capacity,
                    back: Backtrace::new(),
                });
            }
        }
        packets.pending.put_slice(src);
        Ok(())
    }
    fn write_finalize(&self) -> Result<()> {
        let packets = &mut *self.packets.borrow_mut();
        if packets.pending.is_empty() {
            return Ok(());
        }
        let packet = packets.pending.split();
        packets.lengths.push_back(packet.len());
        packets.data.unsplit(packet);
        Ok(())
    }
    fn write_abort(&self) {
        self.packets.borrow_mut().pending.clear()
    }
}

impl Readable for PacketBuffer {
    fn get_read_ready(&self) -> usize {
        self.packets
            .borrow()
            .lengths
            .front()
            .copied()
            .unwrap_or(0)
    }
    fn read_u8(&self) -> Option<u8> {
        let packets = &mut *self.packets.borrow_mut();
        match packets.lengths.front_mut() {
            Some(left) if *left > 0 => {
                *left -= 1;
                Some(packets.data.get_u8())
            }
            _ => None,
        }
    }
    fn read_finalize(&self) {
        let packets = &mut *self.packets.borrow_mut();
        if let Some(left) = packets.lengths.pop_front() {
            packets.data.advance(left);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         struct IoWriter                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Adapts a [`std::io::Write`] implementation to [`Writeable`]. Each packet is staged in memory
/// & written to the underlying writer (then flushed) only when it is finalized.
pub struct IoWriter<W: std::io::Write> {
    inner: RefCell<W>,
    // The packet under construction; nothing reaches `inner` until it's finalized
    pending: RefCell<BytesMut>,
}

impl<W: std::io::Write> IoWriter<W> {
    pub fn new(inner: W) -> IoWriter<W> {
        IoWriter {
            inner: RefCell::new(inner),
            pending: RefCell::new(BytesMut::new()),
        }
    }
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl IoWriter<std::io::Stdout> {
    /// Write to this process' standard output
    pub fn stdout() -> IoWriter<std::io::Stdout> {
        IoWriter::new(std::io::stdout())
    }
}

impl<W: std::io::Write> Writeable for IoWriter<W> {
    fn write_bytes(&self, src: &[u8]) -> Result<()> {
        self.pending.borrow_mut().put_slice(src);
        Ok(())
    }
    /// Hand the pending packet to the underlying writer in one go. The packet is discarded whether
    /// or not the write succeeds, so a failure never leaks a partial packet into the next one.
    fn write_finalize(&self) -> Result<()> {
        let packet = self.pending.borrow_mut().split();
        let mut inner = self.inner.borrow_mut();
        inner.write_all(&packet)?;
        inner.flush()?;
        Ok(())
    }
    fn write_abort(&self) {
        self.pending.borrow_mut().clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_packet_boundaries() {
        let buf = PacketBuffer::new();
        assert_eq!(buf.get_read_ready(), 0);
        assert_eq!(buf.read_u8(), None);

        buf.write_bytes(b"ab").unwrap();
        buf.write_bytes(b"c").unwrap();
        buf.write_finalize().unwrap();
        buf.write_bytes(b"de").unwrap();
        buf.write_finalize().unwrap();
        buf.write_finalize().unwrap(); // empty writes don't produce packets
        assert_eq!(buf.packets(), 2);
        assert_eq!(buf.len(), 5);

        assert_eq!(buf.get_read_ready(), 3);
        assert_eq!(buf.read_u8(), Some(b'a'));
        assert_eq!(buf.get_read_ready(), 2);
        // Discards "bc"
        buf.read_finalize();
        assert_eq!(buf.get_read_ready(), 2);
        assert_eq!(buf.read_str(), "de");
        assert!(buf.is_empty());
        assert_eq!(buf.packets(), 0);
        buf.read_finalize(); // nothing to discard, must not panic
    }

    #[test]
    fn test_exhausted_packet() {
        let buf = PacketBuffer::new();
        buf.write_bytes(b"x").unwrap();
        buf.write_finalize().unwrap();
        buf.write_bytes(b"y").unwrap();
        buf.write_finalize().unwrap();
        assert_eq!(buf.read_u8(), Some(b'x'));
        // The next packet isn't visible until this one is finalized
        assert_eq!(buf.get_read_ready(), 0);
        assert_eq!(buf.read_u8(), None);
        buf.read_finalize();
        assert_eq!(buf.read_u8(), Some(b'y'));
    }

    #[test]
    fn test_capacity() {
        let buf = PacketBuffer::with_capacity(4);
        buf.write_bytes(b"abc").unwrap();
        assert!(matches!(
            buf.write_bytes(b"de"),
            Err(Error::BufferFull { capacity: 4, .. })
        ));
        buf.write_abort();
        assert_eq!(buf.get_read_ready(), 0);
        buf.write_bytes(b"abcd").unwrap();
        buf.write_finalize().unwrap();
        assert_eq!(buf.read_str(), "abcd");
    }

    #[test]
    fn test_shared_handles() {
        let buf = Rc::new(PacketBuffer::new());
        let writer = buf.clone();
        writer.write_bytes(b"shared").unwrap();
        (&writer).write_finalize().unwrap();
        assert_eq!(buf.get_read_ready(), 6);
    }

    #[test]
    fn test_io_writer() {
        let w = IoWriter::new(Vec::new());
        w.write_bytes(b"line\r\n").unwrap();
        w.write_finalize().unwrap();
        assert_eq!(w.into_inner(), b"line\r\n".to_vec());
    }

    struct Broken;

    impl std::io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_io_writer_error() {
        let w = IoWriter::new(Broken);
        // Bytes are only staged until the packet is finalized
        assert!(w.write_bytes(b"x").is_ok());
        assert!(matches!(w.write_finalize(), Err(Error::Io { .. })));
    }

    #[test]
    fn test_io_writer_abort() {
        let w = IoWriter::new(Vec::new());
        w.write_bytes(b"partial").unwrap();
        w.write_abort();
        w.write_bytes(b"whole\r\n").unwrap();
        w.write_finalize().unwrap();
        assert_eq!(w.into_inner(), b"whole\r\n".to_vec());
    }
}

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
//! Formatting primitives.
//!
//! This module defines [`MessageBuf`], a fixed-capacity text accumulator, together with the
//! free functions that append textual renderings of values to it. Nothing here allocates: every
//! rendering is produced into a small stack array (or directly from the input) & copied into the
//! remaining capacity of the buffer.
//!
//! # Truncation
//!
//! A [`MessageBuf`] never overflows. When an append doesn't fit, as much of _that_ append as fits
//! is copied (cutting text at a UTF-8 character boundary), the buffer is marked as truncated, and
//! every subsequent append becomes a no-op. The upshot is that a truncated message is always a
//! prefix of the message that would have been produced given unlimited space.
//!
//! # Renderings
//!
//! | primitive                | example output           |
//! |--------------------------|--------------------------|
//! | [`append_text`]          | `MsgA`                   |
//! | [`append_bool`]          | ` = 1`                   |
//! | [`append_hex`]           | ` = 0x1234` (for a `u16`)|
//! | [`append_hex_bytes`]     | ` = 0x12AB`              |
//! | [`append_dec_unsigned`]  | ` = 4294967295`          |
//! | [`append_dec_signed`]    | ` = -2147483648`         |

/// Default capacity, in bytes, of a single log message (label prefixes included).
pub const MAXLEN: usize = 255;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct MessageBuf                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A fixed-capacity, append-only UTF-8 text buffer holding at most `N` bytes.
#[derive(Clone)]
pub struct MessageBuf<const N: usize = MAXLEN> {
    text: heapless::String<N>,
    truncated: bool,
}

impl<const N: usize> MessageBuf<N> {
    pub const fn new() -> MessageBuf<N> {
        MessageBuf {
            text: heapless::String::new(),
            truncated: false,
        }
    }
    /// Number of bytes currently occupied
    pub fn len(&self) -> usize {
        self.text.len()
    }
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
    /// Total capacity, in bytes
    pub const fn capacity(&self) -> usize {
        N
    }
    /// Remaining room, in bytes
    pub fn remaining(&self) -> usize {
        N - self.text.len()
    }
    /// True once an append has been cut short; all further appends are ignored.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
    /// The text accumulated so far
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
    /// Append `s`, or as much of it as fits. Returns `true` if all of `s` was copied.
    pub fn push_str(&mut self, s: &str) -> bool {
        if self.truncated {
            return false;
        }
        if self.text.push_str(s).is_ok() {
            return true;
        }
        let mut cut = self.remaining();
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        // `cut` bytes are known to fit
        let _ = self.text.push_str(&s[..cut]);
        self.truncated = true;
        false
    }
}

impl<const N: usize> std::default::Default for MessageBuf<N> {
    fn default() -> Self {
        MessageBuf::new()
    }
}

impl<const N: usize> std::fmt::Debug for MessageBuf<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuf")
            .field("text", &self.as_str())
            .field("capacity", &N)
            .field("truncated", &self.truncated)
            .finish()
    }
}

/// Lets `write!()` & friends target a [`MessageBuf`].
///
/// Overflow is absorbed as truncation, same as every other append; this never returns `Err`.
impl<const N: usize> std::fmt::Write for MessageBuf<N> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      formatting primitives                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Integer types with a fixed width in bytes; their bit pattern can be rendered as hex.
pub trait FixedWidth: Copy {
    /// Width of the type, in bytes
    const BYTES: usize;
    /// The value's bit pattern, zero-extended (so two's complement for signed types)
    fn bits(self) -> u64;
}

macro_rules! fixed_width {
    ($($t:ty => $u:ty),* $(,)?) => {
        $(
            impl FixedWidth for $t {
                const BYTES: usize = std::mem::size_of::<$t>();
                fn bits(self) -> u64 {
                    self as $u as u64
                }
            }
        )*
    };
}

fixed_width!(
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => usize,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize,
);

/// Copy `s` verbatim
pub fn append_text<const N: usize>(buf: &mut MessageBuf<N>, s: &str) {
    buf.push_str(s);
}

/// `" = 1"` or `" = 0"`
pub fn append_bool<const N: usize>(buf: &mut MessageBuf<N>, b: bool) {
    buf.push_str(if b { " = 1" } else { " = 0" });
}

/// `" = 0x"` followed by exactly two uppercase hex digits per byte of `T`, most significant first
pub fn append_hex<const N: usize, T: FixedWidth>(buf: &mut MessageBuf<N>, value: T) {
    let ndigits = 2 * T::BYTES;
    let bits = value.bits();
    let mut digits = heapless::String::<16>::new();
    for i in 0..ndigits {
        let shift = 4 * (ndigits - 1 - i);
        let _ = digits.push(char::from(HEX_DIGITS[((bits >> shift) & 0xF) as usize]));
    }
    if buf.push_str(" = 0x") {
        buf.push_str(&digits);
    }
}

/// `" = 0x"` followed by two uppercase hex digits for each byte of `bytes`, in order
pub fn append_hex_bytes<const N: usize>(buf: &mut MessageBuf<N>, bytes: &[u8]) {
    if !buf.push_str(" = 0x") {
        return;
    }
    for b in bytes {
        let mut pair = heapless::String::<2>::new();
        let _ = pair.push(char::from(HEX_DIGITS[(b >> 4) as usize]));
        let _ = pair.push(char::from(HEX_DIGITS[(b & 0xF) as usize]));
        if !buf.push_str(&pair) {
            break;
        }
    }
}

// The minimal decimal rendering of `value`; `u64::MAX` needs twenty digits.
fn decimal_digits(mut value: u64) -> heapless::String<20> {
    let mut rev = [0u8; 20];
    let mut n = 0;
    loop {
        rev[n] = b'0' + (value % 10) as u8;
        n += 1;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    let mut digits = heapless::String::new();
    for &d in rev[..n].iter().rev() {
        let _ = digits.push(char::from(d));
    }
    digits
}

/// `" = "` followed by the minimal decimal representation of `value` (no sign)
pub fn append_dec_unsigned<const N: usize>(buf: &mut MessageBuf<N>, value: u64) {
    if buf.push_str(" = ") {
        buf.push_str(&decimal_digits(value));
    }
}

/// `" = "` followed by an explicit sign (`+` for zero & up) & the minimal decimal magnitude
pub fn append_dec_signed<const N: usize>(buf: &mut MessageBuf<N>, value: i64) {
    let prefix = if value < 0 { " = -" } else { " = +" };
    if buf.push_str(prefix) {
        buf.push_str(&decimal_digits(value.unsigned_abs()));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     value kinds & dispatch                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Values that [`Log::write`](crate::log::Log::write) knows how to render.
///
/// The kind of the value picks the primitive: booleans render as `0`/`1`, integers (signed or
/// not) as fixed-width hex, byte slices as a hex string & text verbatim.
pub trait Loggable {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>);
}

/// Values that [`Log::write_decimal`](crate::log::Log::write_decimal) knows how to render.
pub trait Decimal {
    fn append_decimal<const N: usize>(self, buf: &mut MessageBuf<N>);
}

impl Loggable for bool {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
        append_bool(buf, self)
    }
}

impl Loggable for &str {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
        append_text(buf, self)
    }
}

impl Loggable for &String {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
        append_text(buf, self.as_str())
    }
}

impl Loggable for &[u8] {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
        append_hex_bytes(buf, self)
    }
}

impl<const K: usize> Loggable for &[u8; K] {
    fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
        append_hex_bytes(buf, &self[..])
    }
}

macro_rules! loggable_int {
    ($($t:ty),*) => {
        $(
            impl Loggable for $t {
                fn append_to<const N: usize>(self, buf: &mut MessageBuf<N>) {
                    append_hex(buf, self)
                }
            }
        )*
    };
}

loggable_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

macro_rules! decimal_unsigned {
    ($($t:ty),*) => {
        $(
            impl Decimal for $t {
                fn append_decimal<const N: usize>(self, buf: &mut MessageBuf<N>) {
                    append_dec_unsigned(buf, self as u64)
                }
            }
        )*
    };
}

macro_rules! decimal_signed {
    ($($t:ty),*) => {
        $(
            impl Decimal for $t {
                fn append_decimal<const N: usize>(self, buf: &mut MessageBuf<N>) {
                    append_dec_signed(buf, self as i64)
                }
            }
        )*
    };
}

decimal_unsigned!(u8, u16, u32, u64, usize);
decimal_signed!(i8, i16, i32, i64, isize);

//! Flat packet buffer with offset-addressed body fields.
//!
//! A [`Packet`] owns `HEADER_SIZE + capacity` bytes. Body offsets are
//! measured from the end of the header. The buffer is allocated once per
//! call and reused across the binder and server phases.
//!
//! # Example
//!
//! ```
//! use dynrpc_client::protocol::{MessageKind, Packet, HEADER_SIZE};
//!
//! let mut packet = Packet::with_body_capacity(16).unwrap();
//! packet.set_field(4, b"abc").unwrap();
//! packet.stamp(7, MessageKind::Execute);
//!
//! assert_eq!(packet.frame(7).len(), HEADER_SIZE + 7);
//! assert_eq!(packet.read_kind(), Some(MessageKind::Execute));
//! ```

use super::wire_format::{Header, MessageKind, HEADER_SIZE, INT_SIZE};
use crate::error::{Result, RpcError};

/// Header + body byte buffer.
pub struct Packet {
    buf: Vec<u8>,
}

impl Packet {
    /// Allocate a zeroed packet able to hold `capacity` body bytes.
    ///
    /// # Errors
    ///
    /// Returns `SigTooLong` if the allocation cannot be satisfied.
    pub fn with_body_capacity(capacity: usize) -> Result<Self> {
        let too_long = || RpcError::SigTooLong {
            size: capacity,
            max: isize::MAX as usize - HEADER_SIZE,
        };
        let total = capacity.checked_add(HEADER_SIZE).ok_or_else(too_long)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(total).map_err(|_| too_long())?;
        buf.resize(total, 0);
        Ok(Self { buf })
    }

    /// Number of body bytes this packet can hold.
    #[inline]
    pub fn body_capacity(&self) -> usize {
        self.buf.len() - HEADER_SIZE
    }

    /// Zero the header and the whole body.
    pub fn clear(&mut self) {
        self.buf.fill(0);
    }

    /// Mutable view of `len` body bytes at `offset`.
    pub fn field_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let capacity = self.body_capacity();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= capacity)
            .ok_or(RpcError::PacketOverflow {
                offset,
                len,
                capacity,
            })?;
        Ok(&mut self.buf[HEADER_SIZE + offset..HEADER_SIZE + end])
    }

    /// Body bytes at `offset`, `None` if the range runs past the body.
    pub fn field(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.body().get(offset..end)
    }

    /// Copy `data` into the body at `offset`.
    pub fn set_field(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.field_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Copy body bytes at `offset` into `out`.
    ///
    /// Copies at most `out.len()` bytes and never past the body; returns
    /// the number of bytes copied.
    pub fn get_field(&self, offset: usize, out: &mut [u8]) -> usize {
        let body = self.body();
        if offset >= body.len() {
            return 0;
        }
        let n = out.len().min(body.len() - offset);
        out[..n].copy_from_slice(&body[offset..offset + n]);
        n
    }

    pub fn set_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        self.set_field(offset, &value.to_be_bytes())
    }

    /// Read a big-endian `i32`, `None` if it would run past the body.
    pub fn get_i32(&self, offset: usize) -> Option<i32> {
        let mut raw = [0u8; INT_SIZE];
        (self.get_field(offset, &mut raw) == INT_SIZE).then(|| i32::from_be_bytes(raw))
    }

    /// Read a zero-padded string field of `width` bytes.
    ///
    /// Stops at the first zero byte. Invalid UTF-8 is replaced.
    pub fn get_str(&self, offset: usize, width: usize) -> String {
        let mut raw = vec![0u8; width];
        let n = self.get_field(offset, &mut raw);
        raw.truncate(n);
        if let Some(end) = raw.iter().position(|b| *b == 0) {
            raw.truncate(end);
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Write the header for a body of `len` bytes tagged `kind`.
    ///
    /// Lengths past `u32::MAX` saturate; callers cap bodies below that.
    pub fn stamp(&mut self, len: usize, kind: MessageKind) {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        Header::new(len, kind).encode_into(&mut self.buf[..HEADER_SIZE]);
    }

    /// Current header contents.
    #[inline]
    pub fn header(&self) -> Header {
        // buf always holds at least HEADER_SIZE bytes
        Header {
            body_length: u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]),
            kind: u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]),
        }
    }

    /// Message kind in the header, `None` for unknown tags.
    #[inline]
    pub fn read_kind(&self) -> Option<MessageKind> {
        self.header().kind()
    }

    /// Header plus the first `len` body bytes, ready to send.
    pub fn frame(&self, len: usize) -> &[u8] {
        &self.buf[..HEADER_SIZE + len.min(self.body_capacity())]
    }

    /// Body bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.buf[HEADER_SIZE..]
    }

    /// The whole buffer (header included), for receiving into.
    #[inline]
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_stamp_saturates_length() {
        let mut packet = Packet::with_body_capacity(0).unwrap();
        packet.stamp(u32::MAX as usize + 5, MessageKind::Execute);
        assert_eq!(packet.header().body_length, u32::MAX);
    }

    #[test]
    fn test_new_packet_is_zeroed() {
        let packet = Packet::with_body_capacity(32).unwrap();
        assert_eq!(packet.body_capacity(), 32);
        assert!(packet.body().iter().all(|b| *b == 0));
        assert_eq!(packet.read_kind(), None);
    }

    #[test]
    fn test_set_get_field() {
        let mut packet = Packet::with_body_capacity(8).unwrap();
        packet.set_field(2, b"hey").unwrap();

        let mut out = [0u8; 3];
        assert_eq!(packet.get_field(2, &mut out), 3);
        assert_eq!(&out, b"hey");
        assert_eq!(&packet.body()[..5], b"\0\0hey");
    }

    #[test]
    fn test_set_field_overflow_rejected() {
        let mut packet = Packet::with_body_capacity(4).unwrap();
        assert!(packet.set_field(2, b"abc").is_err());
        assert!(packet.set_field(usize::MAX, b"a").is_err());
        // nothing written on failure
        assert!(packet.body().iter().all(|b| *b == 0));
        // exact fit is fine
        packet.set_field(1, b"abc").unwrap();
    }

    #[test]
    fn test_get_field_clamps_to_body() {
        let mut packet = Packet::with_body_capacity(4).unwrap();
        packet.set_field(0, b"wxyz").unwrap();

        let mut out = [0u8; 8];
        assert_eq!(packet.get_field(2, &mut out), 2);
        assert_eq!(&out[..2], b"yz");
        assert_eq!(packet.get_field(9, &mut out), 0);
    }

    #[test]
    fn test_i32_fields_are_big_endian() {
        let mut packet = Packet::with_body_capacity(8).unwrap();
        packet.set_i32(4, -2).unwrap();
        assert_eq!(&packet.body()[4..8], &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(packet.get_i32(4), Some(-2));
        assert_eq!(packet.get_i32(6), None);
    }

    #[test]
    fn test_get_str_stops_at_zero() {
        let mut packet = Packet::with_body_capacity(16).unwrap();
        packet.set_field(0, b"host\0junk").unwrap();
        assert_eq!(packet.get_str(0, 16), "host");
        // field fully used, no terminator
        packet.set_field(0, b"abcdefghijklmnop").unwrap();
        assert_eq!(packet.get_str(0, 4), "abcd");
    }

    #[test]
    fn test_stamp_and_frame() {
        let mut packet = Packet::with_body_capacity(10).unwrap();
        packet.stamp(6, MessageKind::LocationRequest);

        let header = packet.header();
        assert_eq!(header.body_length, 6);
        assert_eq!(packet.read_kind(), Some(MessageKind::LocationRequest));
        assert_eq!(packet.frame(6).len(), HEADER_SIZE + 6);
        // frame never exceeds the buffer
        assert_eq!(packet.frame(100).len(), HEADER_SIZE + 10);
    }

    #[test]
    fn test_clear_wipes_header_and_body() {
        let mut packet = Packet::with_body_capacity(4).unwrap();
        packet.set_field(0, b"abcd").unwrap();
        packet.stamp(4, MessageKind::Execute);
        packet.clear();
        assert!(packet.frame(4).iter().all(|b| *b == 0));
    }

    #[test]
    fn test_huge_capacity_is_sig_too_long() {
        let err = Packet::with_body_capacity(usize::MAX).err().unwrap();
        assert_eq!(err.code(), crate::error::SIG_TOO_LONG);
    }
}

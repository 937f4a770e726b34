//! LEB128 variable-length integer encoding/decoding.

// Every `as` cast below is on a value already bounded to the target type.
#![allow(clippy::as_conversions)]

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

/// Integers that can be encoded as and decoded from LEB128.
///
/// Protobuf calls these "varints": 7 data bits per byte, least significant
/// group first, with the most significant bit of each byte set when more
/// bytes follow.
pub trait LebCodec: Sized + Copy {
    /// Largest number of bytes a value of this type occupies.
    const MAX_LEB_BYTES: u32;

    /// Decode a LEB128 integer from the front of `data`.
    ///
    /// Returns the decoded value and the number of bytes it occupied. Fails
    /// with [`DecodeError::UnexpectedEndOfBuffer`] when `data` ends before the
    /// terminating byte, and with [`DecodeError::InvalidVarint`] when the
    /// encoding is longer than [`LebCodec::MAX_LEB_BYTES`] or overflows.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Decode a LEB128 integer from `buf`, advancing past it.
    fn decode_leb128_buf<B: Buf + ?Sized>(buf: &mut B) -> Result<(Self, usize), DecodeError> {
        let chunk = buf.chunk();
        let chunk_len = chunk.len();

        // Fast path: the whole varint lives in the current chunk.
        match Self::decode_leb128(chunk) {
            Ok((value, bytes_read)) => {
                buf.advance(bytes_read);
                return Ok((value, bytes_read));
            }
            Err(DecodeError::UnexpectedEndOfBuffer) if buf.remaining() > chunk_len => (),
            Err(err) => return Err(err),
        }

        // Slow path: the varint straddles chunks, gather it byte by byte.
        let mut buffer = [0u8; 10];
        for i in 0..Self::MAX_LEB_BYTES as usize {
            if !buf.has_remaining() {
                return Err(DecodeError::unexpected_end_of_buffer());
            }
            buffer[i] = buf.get_u8();
            if buffer[i] < 0x80 {
                return Self::decode_leb128(&buffer[..=i]);
            }
        }
        Err(DecodeError::invalid_varint())
    }

    /// Encode `self` as LEB128 into `buf`, returning the number of bytes written.
    fn encode_leb128<B: BufMut + ?Sized>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: u32 = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut value = 0u64;
        for (i, b) in data.iter().copied().enumerate() {
            if i == 9 {
                // The 10th byte only has room for the single remaining bit.
                if b >= 0x02 {
                    return Err(DecodeError::invalid_varint());
                }
                return Ok((value | (u64::from(b) << 63), 10));
            }
            value |= u64::from(b & 0x7f) << (7 * i);
            if b < 0x80 {
                return Ok((value, i + 1));
            }
        }
        Err(DecodeError::unexpected_end_of_buffer())
    }

    #[inline]
    fn encode_leb128<B: BufMut + ?Sized>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 1;
        while value >= 0x80 {
            buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
            written += 1;
        }
        buf.put_u8(value as u8);
        written
    }

    /// Byte count from the number of significant bits.
    #[inline]
    fn encoded_leb128_len(self) -> usize {
        #[rustfmt::skip]
        const LZ_TO_LEN: [u8; 65] = [
            10,                                         // 0:     64 bits -> 10 bytes
            9, 9, 9, 9, 9, 9, 9,                        // 1-7:   63-57 bits -> 9 bytes
            8, 8, 8, 8, 8, 8, 8,                        // 8-14:  56-50 bits -> 8 bytes
            7, 7, 7, 7, 7, 7, 7,                        // 15-21: 49-43 bits -> 7 bytes
            6, 6, 6, 6, 6, 6, 6,                        // 22-28: 42-36 bits -> 6 bytes
            5, 5, 5, 5, 5, 5, 5,                        // 29-35: 35-29 bits -> 5 bytes
            4, 4, 4, 4, 4, 4, 4,                        // 36-42: 28-22 bits -> 4 bytes
            3, 3, 3, 3, 3, 3, 3,                        // 43-49: 21-15 bits -> 3 bytes
            2, 2, 2, 2, 2, 2, 2,                        // 50-56: 14-8 bits  -> 2 bytes
            1, 1, 1, 1, 1, 1, 1, 1,                     // 57-64: 7-0 bits   -> 1 byte
        ];
        LZ_TO_LEN[self.leading_zeros() as usize] as usize
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: u32 = 5;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut value = 0u32;
        for (i, b) in data.iter().copied().enumerate() {
            if i == 4 {
                // Only 4 bits remain for the 5th byte.
                if b >= 0x10 {
                    return Err(DecodeError::invalid_varint());
                }
                return Ok((value | (u32::from(b) << 28), 5));
            }
            value |= u32::from(b & 0x7f) << (7 * i);
            if b < 0x80 {
                return Ok((value, i + 1));
            }
        }
        Err(DecodeError::unexpected_end_of_buffer())
    }

    #[inline]
    fn encode_leb128<B: BufMut + ?Sized>(self, buf: &mut B) -> usize {
        u64::from(self).encode_leb128(buf)
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        #[rustfmt::skip]
        const LZ_TO_LEN: [u8; 33] = [
            5, 5, 5, 5,                         // 0-3:   32-29 bits -> 5 bytes
            4, 4, 4, 4, 4, 4, 4,                // 4-10:  28-22 bits -> 4 bytes
            3, 3, 3, 3, 3, 3, 3,                // 11-17: 21-15 bits -> 3 bytes
            2, 2, 2, 2, 2, 2, 2,                // 18-24: 14-8 bits  -> 2 bytes
            1, 1, 1, 1, 1, 1, 1, 1,             // 25-32: 7-0 bits   -> 1 byte
        ];
        LZ_TO_LEN[self.leading_zeros() as usize] as usize
    }
}

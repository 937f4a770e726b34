//! Cursor over an encoded protobuf buffer.

use bytes::{Buf, Bytes};

use crate::config::Config;
use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::wire::{decode_key, decode_len, ProtoKey};

/// Reads protobuf primitives from the front of an in-memory buffer.
///
/// Length-delimited payloads are split off the underlying [`Bytes`] without
/// copying. The reader also tracks the nesting depth of the current message,
/// bounded by [`Config::max_depth`].
#[derive(Debug, Clone)]
pub struct ProtoReader {
    buf: Bytes,
    depth: u32,
    config: Config,
}

impl ProtoReader {
    /// Create a reader over `buf` with the default [`Config`].
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self::with_config(buf, Config::default())
    }

    /// Create a reader over `buf` with the provided [`Config`].
    pub fn with_config(buf: impl Into<Bytes>, config: Config) -> Self {
        ProtoReader {
            buf: buf.into(),
            depth: 0,
            config,
        }
    }

    /// Configuration this reader decodes with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Nesting depth of the message currently being read, zero at the root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns `true` if there are unread bytes.
    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    /// Reads a field key.
    #[inline]
    pub fn read_key(&mut self) -> Result<ProtoKey, DecodeError> {
        decode_key(&mut self.buf)
    }

    /// Reads a varint of up to 64 bits.
    #[inline]
    pub fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let (value, _) = u64::decode_leb128_buf(&mut self.buf)?;
        Ok(value)
    }

    /// Reads a varint and keeps its low 32 bits.
    ///
    /// Negative `int32` values are written sign-extended to 10 bytes, so the
    /// full 64-bit form has to be accepted here.
    #[inline]
    pub fn read_varint32(&mut self) -> Result<u32, DecodeError> {
        #[allow(clippy::as_conversions)]
        let value = self.read_varint64()? as u32;
        Ok(value)
    }

    /// Reads a little-endian 32-bit value.
    #[inline]
    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        if self.buf.remaining() < 4 {
            return Err(DecodeError::unexpected_end_of_buffer());
        }
        Ok(self.buf.get_u32_le())
    }

    /// Reads a little-endian 64-bit value.
    #[inline]
    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        if self.buf.remaining() < 8 {
            return Err(DecodeError::unexpected_end_of_buffer());
        }
        Ok(self.buf.get_u64_le())
    }

    /// Reads a length prefix and returns the payload that follows it.
    pub fn read_length_delimited(&mut self) -> Result<Bytes, DecodeError> {
        let len = decode_len(&mut self.buf)?;
        self.read_bytes(len)
    }

    /// Reads a length-delimited payload and validates it as UTF-8.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let payload = self.read_length_delimited()?;
        String::from_utf8(payload.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Splits off the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, DecodeError> {
        if self.buf.remaining() < len {
            return Err(DecodeError::unexpected_end_of_buffer());
        }
        Ok(self.buf.split_to(len))
    }

    /// Reader for the body of a nested message, one level deeper than `self`.
    pub(crate) fn nested(&self, body: Bytes) -> Result<ProtoReader, DecodeError> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(DecodeError::RecursionLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(ProtoReader {
            buf: body,
            depth,
            config: self.config,
        })
    }

    /// Reader for a packed blob at the current depth.
    pub(crate) fn packed(&self, blob: Bytes) -> ProtoReader {
        ProtoReader {
            buf: blob,
            depth: self.depth,
            config: self.config,
        }
    }
}

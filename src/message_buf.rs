use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::DataFlashError;

/// `MessageBuf` wraps the body bytes of one record and allows the caller to
/// successively take values from it without manually calculating
/// index offsets. Each `take_*` method retrieves the next value
/// of a specific type and advances the internal index accordingly.
/// Little endian byte order is assumed.
///
/// # Example
///
/// ```rust
/// use dataflash::message_buf::MessageBuf;
///
/// let body: Vec<u8> = vec![
///     0xEF, 0xBE, 0xAD, 0xDE, // u32: 0xDEADBEEF
///     0x7F,                   // i8: 127
///     b'G', b'P', b'S', 0x00, // char[4]: "GPS"
/// ];
///
/// let mut message_buf = MessageBuf::new(&body);
///
/// assert_eq!(message_buf.take_u32().unwrap(), 0xDEADBEEF);
/// assert_eq!(message_buf.take_i8().unwrap(), 127);
/// assert_eq!(message_buf.take_string(4).unwrap(), "GPS");
/// assert!(message_buf.is_empty());
/// ```
pub struct MessageBuf<'a> {
    /// The record body from which values will be read.
    buf: &'a [u8],

    /// The current position in the body, starting at zero.
    current_index: usize,
}

impl<'a> MessageBuf<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            current_index: 0,
        }
    }

    /// Returns the number of bytes not yet taken.
    pub fn len(&self) -> usize {
        self.buf.len().saturating_sub(self.current_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the next byte to be taken, relative to the start of the body.
    pub fn position(&self) -> usize {
        self.current_index
    }

    pub fn take_u8(&mut self) -> Result<u8, DataFlashError> {
        self.advance(size_of::<u8>()).map(|bytes| bytes[0])
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn take_i8(&mut self) -> Result<i8, DataFlashError> {
        self.advance(size_of::<i8>()).map(|bytes| bytes[0] as i8)
    }

    pub fn take_u16(&mut self) -> Result<u16, DataFlashError> {
        self.advance(size_of::<u16>()).map(LittleEndian::read_u16)
    }

    pub fn take_i16(&mut self) -> Result<i16, DataFlashError> {
        self.advance(size_of::<i16>()).map(LittleEndian::read_i16)
    }

    pub fn take_u32(&mut self) -> Result<u32, DataFlashError> {
        self.advance(size_of::<u32>()).map(LittleEndian::read_u32)
    }

    pub fn take_i32(&mut self) -> Result<i32, DataFlashError> {
        self.advance(size_of::<i32>()).map(LittleEndian::read_i32)
    }

    pub fn take_u64(&mut self) -> Result<u64, DataFlashError> {
        self.advance(size_of::<u64>()).map(LittleEndian::read_u64)
    }

    pub fn take_i64(&mut self) -> Result<i64, DataFlashError> {
        self.advance(size_of::<i64>()).map(LittleEndian::read_i64)
    }

    pub fn take_f32(&mut self) -> Result<f32, DataFlashError> {
        self.advance(size_of::<f32>()).map(LittleEndian::read_f32)
    }

    pub fn take_f64(&mut self) -> Result<f64, DataFlashError> {
        self.advance(size_of::<f64>()).map(LittleEndian::read_f64)
    }

    /// Takes a fixed-width, NUL-padded character field.
    ///
    /// The string ends at the first NUL byte; anything after it is padding.
    /// Invalid UTF-8 is replaced rather than rejected, since vendor strings are not guaranteed to be clean.
    pub fn take_string(&mut self, width: usize) -> Result<String, DataFlashError> {
        self.take_cstr(width)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Takes a fixed-width, NUL-padded field as raw bytes, up to the first NUL.
    pub fn take_cstr(&mut self, width: usize) -> Result<&'a [u8], DataFlashError> {
        self.advance(width).map(until_nul)
    }

    /// Advances the internal index by `size` and returns the bytes passed over.
    ///
    /// Fails with `DataFlashError::Decode` if fewer than `size` bytes remain.
    pub fn advance(&mut self, size: usize) -> Result<&'a [u8], DataFlashError> {
        if size > self.len() {
            Err(DataFlashError::Decode {
                offset: self.current_index,
                needed: size,
                remaining: self.len(),
            })
        } else {
            let bytes = &self.buf[self.current_index..self.current_index + size];
            self.current_index += size;
            Ok(bytes)
        }
    }

    pub fn skip(&mut self, size: usize) -> Result<(), DataFlashError> {
        self.advance(size).map(|_| ())
    }
}

pub(crate) fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_sequence() -> Result<(), DataFlashError> {
        let body = [
            0x2A, // u8
            0xD6, // i8: -42
            0x18, 0xFC, // i16: -1000
            0xE8, 0x03, // u16: 1000
            0xC0, 0x1D, 0xFE, 0xFF, // i32: -123456
            0x00, 0x00, 0x80, 0x3F, // f32: 1.0
        ];
        let mut buf = MessageBuf::new(&body);

        assert_eq!(buf.take_u8()?, 42);
        assert_eq!(buf.take_i8()?, -42);
        assert_eq!(buf.take_i16()?, -1000);
        assert_eq!(buf.take_u16()?, 1000);
        assert_eq!(buf.take_i32()?, -123456);
        assert_eq!(buf.take_f32()?, 1.0);
        assert!(buf.is_empty());

        Ok(())
    }

    #[test]
    fn test_take_string_stops_at_first_nul() -> Result<(), DataFlashError> {
        let body = *b"IMU\0\xFF\xFFjunk";
        let mut buf = MessageBuf::new(&body);

        assert_eq!(buf.take_string(10)?, "IMU");
        assert_eq!(buf.position(), 10);

        Ok(())
    }

    #[test]
    fn test_take_string_without_nul_uses_full_width() -> Result<(), DataFlashError> {
        let mut buf = MessageBuf::new(b"BARO");
        assert_eq!(buf.take_string(4)?, "BARO");
        Ok(())
    }

    #[test]
    fn test_take_cstr_keeps_raw_bytes() -> Result<(), DataFlashError> {
        let mut buf = MessageBuf::new(b"s\xB5m\0\0F");
        assert_eq!(buf.take_cstr(5)?, b"s\xB5m");
        assert_eq!(buf.position(), 5);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds() {
        let body = [0x01, 0x02, 0x03];
        let mut buf = MessageBuf::new(&body);
        buf.skip(1).unwrap();

        match buf.take_u32() {
            Err(DataFlashError::Decode {
                offset,
                needed,
                remaining,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected a decode error, got {other:?}"),
        }

        // A failed take does not consume anything.
        assert_eq!(buf.len(), 2);
    }
}

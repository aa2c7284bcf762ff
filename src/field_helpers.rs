use crate::errors::DataFlashError;
use crate::message_buf::MessageBuf;

pub trait ParseFromBuf: Sized {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError>;
}

impl ParseFromBuf for u8 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_u8()
    }
}
impl ParseFromBuf for i8 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_i8()
    }
}
impl ParseFromBuf for u16 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_u16()
    }
}
impl ParseFromBuf for i16 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_i16()
    }
}
impl ParseFromBuf for u32 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_u32()
    }
}
impl ParseFromBuf for i32 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_i32()
    }
}
impl ParseFromBuf for u64 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_u64()
    }
}
impl ParseFromBuf for i64 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_i64()
    }
}
impl ParseFromBuf for f32 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_f32()
    }
}
impl ParseFromBuf for f64 {
    fn parse_from_buf(buf: &mut MessageBuf) -> Result<Self, DataFlashError> {
        buf.take_f64()
    }
}

pub fn parse_data_field<T: ParseFromBuf>(message_buf: &mut MessageBuf) -> Result<T, DataFlashError> {
    T::parse_from_buf(message_buf)
}

/// Reads a fixed-point integer and converts it to `f64` using `scale`.
pub fn parse_scaled_field<T>(message_buf: &mut MessageBuf, scale: f64) -> Result<f64, DataFlashError>
where
    T: ParseFromBuf + Into<f64>,
{
    Ok(parse_data_field::<T>(message_buf)?.into() * scale)
}

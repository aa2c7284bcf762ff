use crate::errors::DataFlashError;
use crate::message_buf::MessageBuf;
use crate::model::Schema;

pub(crate) const FMT_NAME_LEN: usize = 4;
pub(crate) const FMT_FORMAT_LEN: usize = 16;
pub(crate) const FMT_COLUMNS_LEN: usize = 64;

/// Body length of an FMT record: type, length, then the three padded strings.
pub(crate) const FMT_BODY_LEN: usize = 2 + FMT_NAME_LEN + FMT_FORMAT_LEN + FMT_COLUMNS_LEN;

/// The encoding selected by a single character of an FMT format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// `B`
    U8,
    /// `b`
    I8,
    /// `H`
    U16,
    /// `h`
    I16,
    /// `I`
    U32,
    /// `i`
    I32,
    /// `Q`
    U64,
    /// `q`
    I64,
    /// `f`
    F32,
    /// `d`
    F64,
    /// `c`: int16 in hundredths.
    CentiI16,
    /// `C`: uint16 in hundredths.
    CentiU16,
    /// `e`: int32 in hundredths.
    CentiI32,
    /// `E`: uint32 in hundredths.
    CentiU32,
    /// `L`: int32 latitude/longitude in units of 1e-7 degrees.
    LatLon,
    /// `n`
    Char4,
    /// `N`
    Char16,
    /// `Z`
    Char64,
}

impl FormatTag {
    pub fn from_byte(byte: u8) -> Option<FormatTag> {
        use FormatTag::*;
        Some(match byte {
            b'B' => U8,
            b'b' => I8,
            b'H' => U16,
            b'h' => I16,
            b'I' => U32,
            b'i' => I32,
            b'Q' => U64,
            b'q' => I64,
            b'f' => F32,
            b'd' => F64,
            b'c' => CentiI16,
            b'C' => CentiU16,
            b'e' => CentiI32,
            b'E' => CentiU32,
            b'L' => LatLon,
            b'n' => Char4,
            b'N' => Char16,
            b'Z' => Char64,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        use FormatTag::*;
        match self {
            U8 => 'B',
            I8 => 'b',
            U16 => 'H',
            I16 => 'h',
            U32 => 'I',
            I32 => 'i',
            U64 => 'Q',
            I64 => 'q',
            F32 => 'f',
            F64 => 'd',
            CentiI16 => 'c',
            CentiU16 => 'C',
            CentiI32 => 'e',
            CentiU32 => 'E',
            LatLon => 'L',
            Char4 => 'n',
            Char16 => 'N',
            Char64 => 'Z',
        }
    }

    /// Number of body bytes a field of this encoding occupies.
    pub fn width(self) -> usize {
        use FormatTag::*;
        match self {
            U8 | I8 => 1,
            U16 | I16 | CentiI16 | CentiU16 => 2,
            U32 | I32 | F32 | CentiI32 | CentiU32 | LatLon | Char4 => 4,
            U64 | I64 | F64 => 8,
            Char16 => 16,
            Char64 => 64,
        }
    }

    /// True for encodings whose fixed-point scale is already applied while decoding.
    /// A unit multiplier must not be applied on top of these.
    pub fn has_builtin_scaling(self) -> bool {
        use FormatTag::*;
        matches!(self, CentiI16 | CentiU16 | CentiI32 | CentiU32 | LatLon)
    }
}

/// Width of a raw format character. Characters outside the table advance by zero bytes.
pub fn format_width(byte: u8) -> usize {
    FormatTag::from_byte(byte).map_or(0, FormatTag::width)
}

/// Stands in for a non-ASCII byte of a tag string. No format, unit or multiplier table knows it.
pub(crate) const UNKNOWN_TAG: char = '~';

/// Converts one-byte-per-field tag strings (formats, unit ids, multiplier ids) to text.
///
/// Every byte yields exactly one char, so the n-th char still describes the n-th field.
pub(crate) fn tag_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { UNKNOWN_TAG })
        .collect()
}

/// Parses the fixed layout body of an FMT record into a `Schema`.
pub(crate) fn parse_fmt(mut message_buf: MessageBuf) -> Result<Schema, DataFlashError> {
    let type_id = message_buf.take_u8()?;
    let record_length = message_buf.take_u8()?;
    let name = message_buf.take_string(FMT_NAME_LEN)?;
    let format = tag_string(message_buf.take_cstr(FMT_FORMAT_LEN)?);
    let columns = message_buf.take_string(FMT_COLUMNS_LEN)?;

    log::trace!("FMT: type={type_id} len={record_length} name={name} format={format} columns={columns}");

    Ok(Schema::new(type_id, record_length, name, format, columns))
}

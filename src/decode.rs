use crate::errors::DataFlashError;
use crate::field_helpers::{parse_data_field, parse_scaled_field};
use crate::formats::{format_width, FormatTag};
use crate::message_buf::{until_nul, MessageBuf};
use crate::model::{Field, FieldValue, Schema};

const CENTI: f64 = 0.01;
const LAT_LON_SCALE: f64 = 1e-7;

/// Decodes one record body into named fields, following `schema.format`.
///
/// Decoding walks the format and the column names together and stops at whichever ends
/// first, or at a NUL in the format. Format characters outside the table produce no field
/// and advance by their table width (zero).
///
/// Returns `DataFlashError::Decode` if the body is shorter than the layout requires.
pub fn decode_body(body: &[u8], schema: &Schema) -> Result<Vec<Field>, DataFlashError> {
    let mut message_buf = MessageBuf::new(body);
    let mut fields: Vec<Field> = Vec::with_capacity(schema.format.len());

    for (format_char, column) in schema.format.bytes().zip(schema.column_names()) {
        if format_char == 0 {
            break;
        }

        let Some(tag) = FormatTag::from_byte(format_char) else {
            log::trace!(
                "{}.{column}: unknown format character {:?}, no value emitted",
                schema.name,
                format_char as char
            );
            message_buf.skip(format_width(format_char))?;
            continue;
        };

        let value = parse_field_value(tag, &mut message_buf).map_err(|err| {
            log::debug!("{}.{column}: {err}", schema.name);
            err
        })?;

        log::trace!("{}.{column} = {value:?}", schema.name);
        insert_field(&mut fields, column, value);
    }

    Ok(fields)
}

/// The raw bytes of a string column, up to its first NUL, located the same way `decode_body` walks the layout.
///
/// A repeated column name resolves to its last occurrence.
pub(crate) fn raw_string_field<'a>(body: &'a [u8], schema: &Schema, name: &str) -> Option<&'a [u8]> {
    let mut offset = 0;
    let mut found = None;

    for (format_char, column) in schema.format.bytes().zip(schema.column_names()) {
        if format_char == 0 {
            break;
        }
        let width = format_width(format_char);
        let is_string = matches!(
            FormatTag::from_byte(format_char),
            Some(FormatTag::Char4 | FormatTag::Char16 | FormatTag::Char64)
        );
        if is_string && column == name {
            found = body.get(offset..offset + width);
        }
        offset += width;
    }

    found.map(until_nul)
}

fn parse_field_value(
    tag: FormatTag,
    message_buf: &mut MessageBuf,
) -> Result<FieldValue, DataFlashError> {
    Ok(match tag {
        FormatTag::U8 => FieldValue::U8(parse_data_field(message_buf)?),
        FormatTag::I8 => FieldValue::I8(parse_data_field(message_buf)?),
        FormatTag::U16 => FieldValue::U16(parse_data_field(message_buf)?),
        FormatTag::I16 => FieldValue::I16(parse_data_field(message_buf)?),
        FormatTag::U32 => FieldValue::U32(parse_data_field(message_buf)?),
        FormatTag::I32 => FieldValue::I32(parse_data_field(message_buf)?),
        FormatTag::U64 => FieldValue::U64(parse_data_field(message_buf)?),
        FormatTag::I64 => FieldValue::I64(parse_data_field(message_buf)?),
        FormatTag::F32 => FieldValue::F32(parse_data_field(message_buf)?),
        FormatTag::F64 => FieldValue::F64(parse_data_field(message_buf)?),
        FormatTag::CentiI16 => FieldValue::Scaled(parse_scaled_field::<i16>(message_buf, CENTI)?),
        FormatTag::CentiU16 => FieldValue::Scaled(parse_scaled_field::<u16>(message_buf, CENTI)?),
        FormatTag::CentiI32 => FieldValue::Scaled(parse_scaled_field::<i32>(message_buf, CENTI)?),
        FormatTag::CentiU32 => FieldValue::Scaled(parse_scaled_field::<u32>(message_buf, CENTI)?),
        FormatTag::LatLon => {
            FieldValue::Scaled(parse_scaled_field::<i32>(message_buf, LAT_LON_SCALE)?)
        }
        FormatTag::Char4 | FormatTag::Char16 | FormatTag::Char64 => {
            FieldValue::Str(message_buf.take_string(tag.width())?)
        }
    })
}

/// A repeated column name keeps its first position and takes the latest value.
fn insert_field(fields: &mut Vec<Field>, name: &str, value: FieldValue) {
    match fields.iter_mut().find(|field| field.name == name) {
        Some(existing) => existing.value = value,
        None => fields.push(Field {
            name: name.to_string(),
            value,
        }),
    }
}

use std::rc::Rc;

use serde::Serialize;

/// First byte of every record header.
pub const HEAD1: u8 = 0xA3;
/// Second byte of every record header.
pub const HEAD2: u8 = 0x95;
pub(crate) const MAGIC: [u8; 2] = [HEAD1, HEAD2];

pub const HEADER_SIZE: usize = 3;

/// Type id reserved for FMT records, which define the layout of every other type.
pub const FMT_TYPE: u8 = 128;
/// Total length of an FMT record, header included.
pub const FMT_LENGTH: usize = 89;

/// Name of the record type that attaches units and multipliers to other types.
pub const FMTU_NAME: &str = "FMTU";

/// Name of the field holding a record's timestamp in microseconds since boot.
pub const TIME_US_FIELD: &str = "TimeUS";

/// The layout of one message type, as declared by an FMT record.
///
/// `units` and `mults` are populated only when an FMTU record for this type exists in the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub type_id: u8,
    /// Total record length, 3-byte header included.
    pub record_length: u8,
    pub name: String,
    /// One format character per field. A NUL ends the effective field list.
    pub format: String,
    /// Comma separated field names.
    pub columns: String,
    pub units: Option<String>,
    pub mults: Option<String>,
}

impl Schema {
    pub fn new(
        type_id: u8,
        record_length: u8,
        name: impl Into<String>,
        format: impl Into<String>,
        columns: impl Into<String>,
    ) -> Self {
        Schema {
            type_id,
            record_length,
            name: name.into(),
            format: format.into(),
            columns: columns.into(),
            units: None,
            mults: None,
        }
    }

    /// Number of body bytes following the header.
    pub fn body_len(&self) -> usize {
        usize::from(self.record_length).saturating_sub(HEADER_SIZE)
    }

    /// Field names in format order. An empty column string has no names.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .split(',')
            .filter(move |_| !self.columns.is_empty())
    }

    /// Position of `name` among the column names, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names().position(|column| column == name)
    }

    /// The format, unit and multiplier characters for the field at `index`.
    ///
    /// Positions beyond the end of an overlay string, or with no overlay at all, report `'-'`.
    pub fn field_tags(&self, index: usize) -> (u8, u8, u8) {
        let tag_at = |text: Option<&str>| {
            text.and_then(|t| t.as_bytes().get(index).copied())
                .unwrap_or(b'-')
        };

        (
            tag_at(Some(self.format.as_str())),
            tag_at(self.units.as_deref()),
            tag_at(self.mults.as_deref()),
        )
    }
}

/// A decoded value. The variant is fixed by the field's format character.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A fixed-point value already converted by its format (`c`, `C`, `e`, `E`, `L`).
    Scaled(f64),
    Str(String),
}

impl FieldValue {
    /// Numeric view of the value. Strings have none.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        use FieldValue::*;
        match *self {
            U8(v) => Some(f64::from(v)),
            I8(v) => Some(f64::from(v)),
            U16(v) => Some(f64::from(v)),
            I16(v) => Some(f64::from(v)),
            U32(v) => Some(f64::from(v)),
            I32(v) => Some(f64::from(v)),
            U64(v) => Some(v as f64),
            I64(v) => Some(v as f64),
            F32(v) => Some(f64::from(v)),
            F64(v) | Scaled(v) => Some(v),
            Str(_) => None,
        }
    }

    /// Unsigned integer view, for integer variants holding a non-negative value.
    pub fn as_u64(&self) -> Option<u64> {
        use FieldValue::*;
        match *self {
            U8(v) => Some(u64::from(v)),
            U16(v) => Some(u64::from(v)),
            U32(v) => Some(u64::from(v)),
            U64(v) => Some(v),
            I8(v) => u64::try_from(v).ok(),
            I16(v) => u64::try_from(v).ok(),
            I32(v) => u64::try_from(v).ok(),
            I64(v) => u64::try_from(v).ok(),
            F32(_) | F64(_) | Scaled(_) | Str(_) => None,
        }
    }

    /// Signed integer view, for integer variants. `U64` values beyond `i64::MAX` saturate.
    pub fn as_i64(&self) -> Option<i64> {
        use FieldValue::*;
        match *self {
            U8(v) => Some(i64::from(v)),
            I8(v) => Some(i64::from(v)),
            U16(v) => Some(i64::from(v)),
            I16(v) => Some(i64::from(v)),
            U32(v) => Some(i64::from(v)),
            I32(v) => Some(i64::from(v)),
            U64(v) => Some(i64::try_from(v).unwrap_or(i64::MAX)),
            I64(v) => Some(v),
            F32(_) | F64(_) | Scaled(_) | Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        use FieldValue::*;
        matches!(
            self,
            U8(_) | I8(_) | U16(_) | I16(_) | U32(_) | I32(_) | U64(_) | I64(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub type_id: u8,
    pub name: String,
    pub(crate) fields: Vec<Field>,
    /// 1-based count of every known record read since the last rewind, filtered or not.
    pub sequence_number: u64,
    /// Value of the `TimeUS` field, or 0 when the record has no integer `TimeUS`.
    pub time_micros: i64,
    #[serde(skip)]
    pub(crate) schema: Rc<Schema>,
}

impl Message {
    pub(crate) fn new(schema: Rc<Schema>, fields: Vec<Field>, sequence_number: u64) -> Self {
        let time_micros = fields
            .iter()
            .find(|field| field.name == TIME_US_FIELD)
            .and_then(|field| field.value.as_i64())
            .unwrap_or(0);

        Message {
            type_id: schema.type_id,
            name: schema.name.clone(),
            fields,
            sequence_number,
            time_micros,
            schema,
        }
    }

    /// Decoded fields in format order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// A field value paired with the human readable name of its unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledValue {
    pub value: FieldValue,
    pub unit: &'static str,
}

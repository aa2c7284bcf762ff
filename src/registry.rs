use std::io::{Read, Seek};
use std::rc::Rc;

use crate::datastream::DataStream;
use crate::decode::{decode_body, raw_string_field};
use crate::errors::DataFlashError;
use crate::formats::{parse_fmt, tag_string, FMT_BODY_LEN};
use crate::message_buf::MessageBuf;
use crate::model::{Field, FieldValue, Schema, FMTU_NAME, FMT_TYPE, HEADER_SIZE};

const TYPE_ID_SLOTS: usize = 256;

/// The message types declared in a log, indexed by type id.
///
/// Built once by the first pass over the stream and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Option<Rc<Schema>>>,
}

impl SchemaRegistry {
    pub fn get(&self, type_id: u8) -> Option<&Schema> {
        self.get_shared(type_id).map(Rc::as_ref)
    }

    pub(crate) fn get_shared(&self, type_id: u8) -> Option<&Rc<Schema>> {
        self.schemas.get(usize::from(type_id))?.as_ref()
    }

    /// The schema with this name and the lowest type id.
    pub fn by_name(&self, name: &str) -> Option<&Schema> {
        self.iter().find(|schema| schema.name == name)
    }

    /// Registered schemas in ascending type id order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter().flatten().map(Rc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Collects FMT definitions and FMTU overlays, then merges them into a `SchemaRegistry`.
///
/// Overlays are kept apart from the definitions until `freeze`, so an FMTU record may
/// appear before or after the FMT record of its target.
#[derive(Debug)]
pub(crate) struct RegistryBuilder {
    schemas: Vec<Option<Schema>>,
    overlays: Vec<Option<(String, String)>>,
}

impl RegistryBuilder {
    pub(crate) fn new() -> Self {
        RegistryBuilder {
            schemas: vec![None; TYPE_ID_SLOTS],
            overlays: vec![None; TYPE_ID_SLOTS],
        }
    }

    pub(crate) fn get(&self, type_id: u8) -> Option<&Schema> {
        self.schemas[usize::from(type_id)].as_ref()
    }

    /// Registers a definition, replacing any earlier one for the same type id.
    pub(crate) fn define(&mut self, schema: Schema) {
        if usize::from(schema.record_length) < HEADER_SIZE {
            log::warn!(
                "Ignoring FMT for {} (type {}): record length {} is shorter than a header.",
                schema.name,
                schema.type_id,
                schema.record_length
            );
            return;
        }

        log::debug!(
            "FMT {} (type {}, {} bytes): {} [{}]",
            schema.name,
            schema.type_id,
            schema.record_length,
            schema.format,
            schema.columns
        );
        let slot = usize::from(schema.type_id);
        self.schemas[slot] = Some(schema);
    }

    pub(crate) fn attach_units(&mut self, target: u8, units: String, mults: String) {
        log::debug!("FMTU for type {target}: units={units} mults={mults}");
        self.overlays[usize::from(target)] = Some((units, mults));
    }

    pub(crate) fn freeze(self) -> SchemaRegistry {
        let schemas = self
            .schemas
            .into_iter()
            .zip(self.overlays)
            .enumerate()
            .map(|(type_id, (schema, overlay))| match (schema, overlay) {
                (Some(mut schema), Some((units, mults))) => {
                    schema.units = Some(units);
                    schema.mults = Some(mults);
                    Some(Rc::new(schema))
                }
                (Some(schema), None) => Some(Rc::new(schema)),
                (None, Some(_)) => {
                    log::warn!("FMTU references type {type_id}, which has no FMT definition.");
                    None
                }
                (None, None) => None,
            })
            .collect();

        SchemaRegistry { schemas }
    }
}

/// First pass: walks the stream from its current position and discovers every FMT and FMTU record.
///
/// Running out of data, whether at a header, while resynchronizing or inside an FMTU body,
/// ends discovery normally, since logs are often cut short. A truncated FMT body is an error.
/// The caller is responsible for rewinding afterwards.
pub(crate) fn discover_schemas<R: Read + Seek>(
    datastream: &mut DataStream<R>,
) -> Result<SchemaRegistry, DataFlashError> {
    let mut builder = RegistryBuilder::new();

    loop {
        let type_id = match datastream.read_header() {
            Ok(type_id) => type_id,
            Err(DataFlashError::TruncatedStream { .. }) => break,
            Err(DataFlashError::InvalidHeader { offset, .. }) => {
                log::debug!("Invalid header at {offset:#X} during schema discovery.");
                if !resync_or_end(datastream)? {
                    break;
                }
                continue;
            }
            Err(err) => return Err(err),
        };

        if type_id == FMT_TYPE {
            let body = datastream.read_body(FMT_BODY_LEN)?;
            builder.define(parse_fmt(MessageBuf::new(&body))?);
            continue;
        }

        let Some(schema) = builder.get(type_id) else {
            if !resync_or_end(datastream)? {
                break;
            }
            continue;
        };

        let body_len = schema.body_len();

        if schema.name != FMTU_NAME {
            // Known data record: its length is declared, so there is nothing to search for.
            if datastream.skip(body_len)? < body_len {
                break;
            }
            continue;
        }

        let body = match datastream.read_body(body_len) {
            Ok(body) => body,
            Err(DataFlashError::TruncatedStream { .. }) => break,
            Err(err) => return Err(err),
        };

        let overlay = decode_body(&body, schema)
            .map_err(|err| log::warn!("Malformed FMTU record: {err}"))
            .ok()
            .and_then(|fields| unit_overlay(&body, schema, &fields));

        match overlay {
            Some((target, units, mults)) => builder.attach_units(target, units, mults),
            None => {
                log::warn!("FMTU record without usable FmtType/UnitIds/MultIds fields, skipping.");
                if !resync_or_end(datastream)? {
                    break;
                }
            }
        }
    }

    Ok(builder.freeze())
}

/// Resynchronizes, reporting `false` if the stream ended first.
fn resync_or_end<R: Read + Seek>(datastream: &mut DataStream<R>) -> Result<bool, DataFlashError> {
    match datastream.resynchronize() {
        Ok(()) => Ok(true),
        Err(DataFlashError::TruncatedStream { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Extracts (target type id, unit ids, multiplier ids) from a decoded FMTU record.
///
/// The id strings are taken from the raw body as tag strings, one char per byte, so they stay
/// aligned with the target's format even when they hold non-ASCII bytes.
fn unit_overlay(body: &[u8], schema: &Schema, fields: &[Field]) -> Option<(u8, String, String)> {
    let find = |name: &str| {
        fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    };
    let tags = |name: &str| {
        find(name)?.as_str()?;
        raw_string_field(body, schema, name).map(tag_string)
    };

    let FieldValue::U8(target) = find("FmtType")? else {
        return None;
    };

    Some((*target, tags("UnitIds")?, tags("MultIds")?))
}

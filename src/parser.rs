use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::datastream::DataStream;
use crate::decode::decode_body;
use crate::errors::DataFlashError;
use crate::model::{Message, HEADER_SIZE};
use crate::registry::{discover_schemas, SchemaRegistry};

/// A rewindable cursor over the records of a DataFlash log.
///
/// Construction runs a first pass over the whole source to discover every FMT and FMTU
/// record, then rewinds. Messages are then read in stream order with `read_next` or by
/// iterating the parser.
pub struct DataFlashParser<R: Read + Seek> {
    state: State,
    datastream: DataStream<R>,
    schemas: SchemaRegistry,
    message_filter: MessageFilter,
    sequence_number: u64,
}

/// Which type ids `read_next` decodes. Names are resolved to type ids once, against the
/// complete schema registry.
#[derive(Debug, Default)]
pub(crate) struct MessageFilter {
    allowed_ids: Option<HashSet<u8>>,
}

impl MessageFilter {
    /// Resolves `names` against `schemas`, taking the lowest type id for a duplicated name.
    ///
    /// Fails only when none of the names is registered.
    fn resolve(names: Vec<String>, schemas: &SchemaRegistry) -> Result<Self, DataFlashError> {
        let mut allowed_ids = HashSet::new();
        let mut unmatched = Vec::new();

        for name in &names {
            match schemas.by_name(name) {
                Some(schema) => {
                    log::debug!("filter: {name} -> type {}", schema.type_id);
                    allowed_ids.insert(schema.type_id);
                }
                None => unmatched.push(name.clone()),
            }
        }

        if allowed_ids.is_empty() {
            return Err(DataFlashError::InvalidFilter(names));
        }

        if !unmatched.is_empty() {
            log::warn!("Ignoring unknown message names in filter: {}", unmatched.join(", "));
        }

        Ok(MessageFilter {
            allowed_ids: Some(allowed_ids),
        })
    }

    fn is_allowed(&self, type_id: u8) -> bool {
        match &self.allowed_ids {
            None => true,
            Some(set) => set.contains(&type_id),
        }
    }
}

/// The ordering key used by `DataFlashParser::get_slice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKey {
    Sequence,
    TimeMicros,
}

impl SliceKey {
    fn of(self, message: &Message) -> i64 {
        match self {
            SliceKey::Sequence => i64::try_from(message.sequence_number).unwrap_or(i64::MAX),
            SliceKey::TimeMicros => message.time_micros,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum State {
    Ready,
    Reading,
    Exhausted,
}

impl<R: Read + Seek> Iterator for DataFlashParser<R> {
    type Item = Result<Message, DataFlashError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => None, // End of stream.
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: Read + Seek> DataFlashParser<R> {
    /// Discovers the log's schemas and positions the cursor at the first record.
    ///
    /// Fails if the source cannot be read or an FMT record is cut short. A log that simply
    /// ends, even mid-record, yields whatever schemas were found before that point.
    pub fn new(reader: R) -> Result<DataFlashParser<R>, DataFlashError> {
        let mut datastream = DataStream::new(reader);

        let schemas = discover_schemas(&mut datastream)?;
        log::debug!(
            "Discovered {} message types in {} bytes.",
            schemas.len(),
            datastream.position()
        );
        datastream.rewind()?;

        Ok(DataFlashParser {
            state: State::Ready,
            datastream,
            schemas,
            message_filter: MessageFilter::default(),
            sequence_number: 0,
        })
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Byte offset of the next read from the start of the source.
    pub fn position(&self) -> u64 {
        self.datastream.position()
    }

    /// Reads the next record that passes the current filter.
    ///
    /// Returns `Ok(None)` once the source is exhausted. Corrupt bytes between records and
    /// records of unknown type are skipped by resynchronizing on the next header. A body
    /// shorter than its schema declares is an error.
    pub fn read_next(&mut self) -> Result<Option<Message>, DataFlashError> {
        if self.state == State::Exhausted {
            return Ok(None);
        }
        self.state = State::Reading;

        loop {
            let type_id = match self.datastream.read_header() {
                Ok(type_id) => type_id,
                Err(DataFlashError::TruncatedStream { .. }) => return Ok(self.exhaust()),
                Err(DataFlashError::InvalidHeader { offset, found }) => {
                    log::debug!("Invalid header {found:02X?} at {offset:#X}.");
                    if !self.resynchronize()? {
                        return Ok(self.exhaust());
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            let Some(schema) = self.schemas.get_shared(type_id).cloned() else {
                log::debug!(
                    "Unknown type {type_id} at {:#X}.",
                    self.datastream.position() - HEADER_SIZE as u64
                );
                if !self.resynchronize()? {
                    return Ok(self.exhaust());
                }
                continue;
            };

            self.sequence_number += 1;
            let body_len = schema.body_len();

            if !self.message_filter.is_allowed(type_id) {
                if self.datastream.skip(body_len)? < body_len {
                    log::warn!(
                        "{} record #{} runs past the end of the log.",
                        schema.name,
                        self.sequence_number
                    );
                    return Ok(self.exhaust());
                }
                continue;
            }

            let body = self.datastream.read_body(body_len)?;
            let fields = decode_body(&body, &schema)?;

            return Ok(Some(Message::new(schema, fields, self.sequence_number)));
        }
    }

    /// Restricts `read_next` to the named message types and rewinds.
    ///
    /// Unknown names are ignored as long as at least one name is known. Fails with
    /// `InvalidFilter` otherwise, leaving the previous filter and position untouched.
    pub fn set_filter<I, S>(&mut self, names: I) -> Result<(), DataFlashError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.message_filter = MessageFilter::resolve(names, &self.schemas)?;
        self.rewind()
    }

    /// Removes the filter. The read position is kept.
    pub fn clear_filter(&mut self) {
        self.message_filter = MessageFilter::default();
    }

    /// Returns to the first record and restarts sequence numbering.
    pub fn rewind(&mut self) -> Result<(), DataFlashError> {
        log::debug!("Rewinding from {:#X}.", self.datastream.position());
        self.datastream.rewind()?;
        self.sequence_number = 0;
        self.state = State::Ready;
        Ok(())
    }

    /// Collects the messages whose `key` lies in `start..end`, scanning from the first record.
    ///
    /// The current filter applies. Scanning stops at the first message whose key reaches
    /// `end`, and the cursor is left just after it. A final record cut short by the end of
    /// the log ends the slice like the end of the log itself.
    pub fn get_slice(
        &mut self,
        start: i64,
        end: i64,
        key: SliceKey,
    ) -> Result<Vec<Message>, DataFlashError> {
        self.rewind()?;

        let mut slice = Vec::new();
        loop {
            let message = match self.read_next() {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(DataFlashError::TruncatedStream { offset, .. }) => {
                    log::warn!("Slice ends at a truncated record at {offset:#X}.");
                    self.exhaust();
                    break;
                }
                Err(err) => return Err(err),
            };

            let value = key.of(&message);
            if value >= end {
                break;
            }
            if value >= start {
                slice.push(message);
            }
        }

        Ok(slice)
    }

    /// Hands back the underlying source.
    pub fn close(self) -> R {
        self.datastream.into_inner()
    }

    fn resynchronize(&mut self) -> Result<bool, DataFlashError> {
        match self.datastream.resynchronize() {
            Ok(()) => Ok(true),
            Err(DataFlashError::TruncatedStream { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn exhaust(&mut self) -> Option<Message> {
        self.state = State::Exhausted;
        None
    }
}

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use crate::errors::DataFlashError;
use crate::model::{HEAD1, HEAD2, HEADER_SIZE, MAGIC};

/// Byte-level access to a DataFlash log: record headers, bodies, resynchronization and rewinds.
///
/// Tracks its own offset from the start of the source so errors and logs can report positions
/// without asking the reader.
#[derive(Debug)]
pub struct DataStream<R: Read + Seek> {
    reader: R,
    pub(crate) position: u64,
}

impl<R: Read + Seek> DataStream<R> {
    pub fn new(reader: R) -> DataStream<R> {
        DataStream {
            reader,
            position: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Fills `buf` completely, or fails with `TruncatedStream` if the source ends first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DataFlashError> {
        log::trace!(
            "datastream read from:  [{:04X}-{:04X}]",
            self.position,
            self.position + buf.len() as u64
        );

        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                // The amount actually consumed is unknown, so resync the offset from the reader.
                self.position = self.reader.stream_position()?;
                Err(DataFlashError::TruncatedStream {
                    offset: self.position,
                    expected: buf.len(),
                })
            }
            Err(err) => Err(DataFlashError::Io(err)),
        }
    }

    pub fn read_body(&mut self, len: usize) -> Result<Vec<u8>, DataFlashError> {
        let mut body = vec![0; len];
        self.read_exact(&mut body)?;
        Ok(body)
    }

    /// Skips up to `num_bytes` bytes, returning how many were actually skipped.
    ///
    /// Fewer than requested means the source ended.
    #[allow(clippy::cast_possible_truncation)]
    pub fn skip(&mut self, num_bytes: usize) -> Result<usize, DataFlashError> {
        let skipped = io::copy(
            &mut self.reader.by_ref().take(num_bytes as u64),
            &mut io::sink(),
        )?;
        self.position += skipped;

        Ok(skipped as usize)
    }

    /// Reads a 3-byte record header and returns its type id.
    ///
    /// Fails with `TruncatedStream` if fewer than 3 bytes remain and with `InvalidHeader`
    /// if the magic bytes do not match.
    pub fn read_header(&mut self) -> Result<u8, DataFlashError> {
        let offset = self.position;
        let mut header = [0u8; HEADER_SIZE];
        self.read_exact(&mut header)?;

        if header[..2] != MAGIC {
            return Err(DataFlashError::InvalidHeader {
                offset,
                found: [header[0], header[1]],
            });
        }

        log::trace!("header at {offset:#X}: type {}", header[2]);
        Ok(header[2])
    }

    /// Scans forward one byte at a time for the magic pair, then steps back so that the next
    /// `read_header` sees the complete header.
    ///
    /// Fails with `TruncatedStream` if the source ends before the pair is found.
    pub fn resynchronize(&mut self) -> Result<(), DataFlashError> {
        let start = self.position;
        let mut previous: Option<u8> = None;
        let mut byte = [0u8; 1];

        loop {
            self.read_exact(&mut byte)?;

            if previous == Some(HEAD1) && byte[0] == HEAD2 {
                self.reader.seek(SeekFrom::Current(-2))?;
                self.position -= 2;
                log::debug!(
                    "resynchronized at {:#X} after skipping {} bytes",
                    self.position,
                    self.position - start
                );
                return Ok(());
            }

            previous = Some(byte[0]);
        }
    }

    /// Returns to the start of the source.
    pub fn rewind(&mut self) -> Result<(), DataFlashError> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.position = 0;
        Ok(())
    }
}

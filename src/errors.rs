use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataFlashError {
    #[error("Could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated stream at offset {offset}: expected {expected} more bytes")]
    TruncatedStream { offset: u64, expected: usize },

    #[error("Invalid record header at offset {offset}: found {found:02X?}")]
    InvalidHeader { offset: u64, found: [u8; 2] },

    #[error("Record body too short at byte {offset}: needed {needed} bytes, only {remaining} remaining")]
    Decode {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("None of the requested message types exist in this log: {0:?}")]
    InvalidFilter(Vec<String>),

    #[error("Field not found: {0}")]
    FieldNotFound(String),
}

//! Streaming parser for ArduPilot DataFlash (`.bin`) logs.
//!
//! A DataFlash log describes its own record layouts: FMT records declare each message type,
//! and FMTU records attach units and multipliers to them. The parser reads the whole log once
//! to collect these definitions, then rewinds and decodes messages on demand.
//!
//! ```no_run
//! # fn main() -> Result<(), dataflash::DataFlashError> {
//! let mut parser = dataflash::open("flight.bin")?;
//! parser.set_filter(["GPS", "ATT"])?;
//!
//! for message in parser {
//!     let message = message?;
//!     println!("{message}");
//! }
//! # Ok(())
//! # }
//! ```
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod builder;
pub mod datastream;
pub mod decode;
mod display;
pub mod errors;
mod field_helpers;
pub mod formats;
pub mod message_buf;
pub mod model;
pub mod parser;
pub mod registry;
mod scaling;
pub mod units;

pub use builder::DataFlashParserBuilder;
pub use errors::DataFlashError;
pub use model::{Field, FieldValue, Message, ScaledValue, Schema};
pub use parser::{DataFlashParser, SliceKey};
pub use registry::SchemaRegistry;

/// Opens a log file and discovers its schemas.
pub fn open(path: impl AsRef<Path>) -> Result<DataFlashParser<BufReader<File>>, DataFlashError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataFlashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    DataFlashParser::new(BufReader::new(file))
}

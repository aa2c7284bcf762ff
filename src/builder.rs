use std::io::{Read, Seek};

use crate::errors::DataFlashError;
use crate::parser::DataFlashParser;

pub struct DataFlashParserBuilder<R> {
    reader: R,
    message_names: Option<Vec<String>>,
}

impl<R: Read + Seek> DataFlashParserBuilder<R> {
    // Start the builder with a mandatory reader
    #[must_use]
    pub fn new(reader: R) -> Self {
        DataFlashParserBuilder {
            reader,
            message_names: None,
        }
    }

    /// Sets the message types the parser will return.
    ///
    /// By default every record is decoded. Records of other types are skipped by length
    /// without being decoded, but still count towards sequence numbers.
    ///
    /// # Parameters
    /// - `names`: message names as declared by the log's FMT records, e.g. `"GPS"` or `"ATT"`.
    ///
    /// `build()` fails with `InvalidFilter` if none of the names is declared in the log.
    #[must_use]
    pub fn message_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    // Final method to build the `DataFlashParser`
    pub fn build(self) -> Result<DataFlashParser<R>, DataFlashError> {
        let mut parser = DataFlashParser::new(self.reader)?;

        if let Some(names) = self.message_names {
            parser.set_filter(names)?;
        }

        Ok(parser)
    }
}

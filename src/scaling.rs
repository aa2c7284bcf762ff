use std::collections::HashMap;

use crate::errors::DataFlashError;
use crate::formats::FormatTag;
use crate::model::{FieldValue, Message, ScaledValue};
use crate::units::{is_identity_multiplier, multiplier, unit_name};

impl Message {
    /// The value of `name` with its FMTU multiplier applied, paired with its unit name.
    ///
    /// Fields whose format already carries a fixed-point scale (`c`, `C`, `e`, `E`, `L`) are
    /// returned as decoded. Strings keep their value and only gain a unit name.
    ///
    /// ```
    /// # use dataflash::DataFlashError;
    /// # fn show(msg: &dataflash::Message) -> Result<(), DataFlashError> {
    /// let alt = msg.get_scaled("Alt")?;
    /// println!("{alt}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_scaled(&self, name: &str) -> Result<ScaledValue, DataFlashError> {
        let index = self.schema.column_index(name);

        match (self.field(name), index) {
            (Some(value), Some(index)) => Ok(self.scale_at(index, value)),
            _ => Err(DataFlashError::FieldNotFound(name.to_string())),
        }
    }

    /// Every decoded field, scaled as by `get_scaled`, keyed by field name.
    pub fn get_scaled_all(&self) -> HashMap<String, ScaledValue> {
        self.schema
            .column_names()
            .enumerate()
            .filter_map(|(index, column)| {
                let value = self.field(column)?;
                Some((column.to_string(), self.scale_at(index, value)))
            })
            .collect()
    }

    fn scale_at(&self, index: usize, value: &FieldValue) -> ScaledValue {
        let (format_tag, unit_tag, mult_tag) = self.schema.field_tags(index);
        let unit = unit_name(unit_tag);

        let builtin = FormatTag::from_byte(format_tag).is_some_and(|tag| tag.has_builtin_scaling());
        if builtin || is_identity_multiplier(mult_tag) {
            return ScaledValue {
                value: value.clone(),
                unit,
            };
        }

        let scaled = match (value.as_f64(), multiplier(mult_tag)) {
            (Some(number), Some(factor)) => FieldValue::F64(number * factor),
            _ => value.clone(),
        };

        ScaledValue {
            value: scaled,
            unit,
        }
    }
}

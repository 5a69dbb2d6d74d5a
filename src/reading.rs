use crate::config::RecordFields;
use crate::error::ValidationError;
use serde_json::Value;

/// One timestamped observation for a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub key: String,
    pub value: f64,
    pub timestamp: f64,
}

impl Reading {
    pub fn new(key: impl Into<String>, value: f64, timestamp: f64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp,
        }
    }

    /// Extracts a reading from a decoded record.
    ///
    /// All three fields must be present. Unknown extra fields are ignored.
    pub fn from_record(record: &Value, fields: &RecordFields) -> Result<Self, ValidationError> {
        let object = record.as_object().ok_or(ValidationError::NotAnObject)?;

        let field = |name: &'static str| {
            object
                .get(name)
                .ok_or(ValidationError::MissingField(name))
        };

        // Presence is checked for every field before any type is, so a record
        // missing a field always reports the missing field.
        let key = field(fields.key)?;
        let value = field(fields.value)?;
        let timestamp = field(fields.timestamp)?;

        let key = key.as_str().ok_or(ValidationError::InvalidField {
            field: fields.key,
            expected: "string",
        })?;
        let value = value.as_f64().ok_or(ValidationError::InvalidField {
            field: fields.value,
            expected: "number",
        })?;
        let timestamp = timestamp.as_f64().ok_or(ValidationError::InvalidField {
            field: fields.timestamp,
            expected: "number",
        })?;

        Ok(Self::new(key, value, timestamp))
    }
}

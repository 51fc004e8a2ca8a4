//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{CounterId, CounterValidationError, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
    EmptyValue,
    TooLong,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::EmptyValue => "empty_value",
            ErrorCode::TooLong => "too_long",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) const ID: FieldName = FieldName::new("id");
pub(crate) const TITLE: FieldName = FieldName::new("title");
pub(crate) const COUNT: FieldName = FieldName::new("count");

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn invalid_id_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a positive integer")).with_details(json!({
        "field": name,
        "value": value,
        "code": ErrorCode::InvalidId.as_str(),
    }))
}

/// Parse a path segment into a counter id.
pub(crate) fn parse_counter_id(value: &str, field: FieldName) -> Result<CounterId, Error> {
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(CounterId::new)
        .ok_or_else(|| invalid_id_error(field, value))
}

/// Convert a signed request count into the domain's unsigned count.
pub(crate) fn parse_count(value: Option<i64>) -> Result<Option<u64>, Error> {
    value
        .map(|count| {
            u64::try_from(count).map_err(|_| {
                field_error(COUNT, ErrorCode::OutOfRange, "count must not be negative")
            })
        })
        .transpose()
}

pub(crate) fn map_counter_validation_error(error: CounterValidationError) -> Error {
    let message = error.to_string();
    match error {
        CounterValidationError::EmptyTitle => field_error(TITLE, ErrorCode::EmptyValue, message),
        CounterValidationError::TitleTooLong { .. } => {
            field_error(TITLE, ErrorCode::TooLong, message)
        }
        CounterValidationError::CountOutOfRange { .. } => {
            field_error(COUNT, ErrorCode::OutOfRange, message)
        }
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::PgExecError;

/// Values that can be bound as query parameters, read back from rows, or
/// rendered as SQL literals.
///
/// Native values convert with `From`, so most call sites never name a variant:
/// ```rust
/// use pgexec::prelude::*;
///
/// let params: Vec<RowValues> = vec![1_i64.into(), "alice".into(), true.into(), None::<i64>.into()];
/// assert_eq!(params[3], RowValues::Null);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Floating point value (32-bit)
    Real(f32),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value. `timestamptz` columns read back as their UTC wall time.
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// One-dimensional text array; elements may be NULL
    TextArray(Vec<Option<String>>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in panic and scan error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "integer",
            RowValues::Float(_) => "float8",
            RowValues::Real(_) => "float4",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "boolean",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Date(_) => "date",
            RowValues::Null => "NULL",
            RowValues::JSON(_) => "json",
            RowValues::Blob(_) => "bytea",
            RowValues::TextArray(_) => "text[]",
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the value as `f64`, widening 32-bit floats.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Real(value) => Some(f64::from(*value)),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RowValues {
                fn from(value: $t) -> Self {
                    RowValues::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<f32> for RowValues {
    fn from(value: f32) -> Self {
        RowValues::Real(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&String> for RowValues {
    fn from(value: &String) -> Self {
        RowValues::Text(value.clone())
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<NaiveDate> for RowValues {
    fn from(value: NaiveDate) -> Self {
        RowValues::Date(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl From<&RowValues> for RowValues {
    fn from(value: &RowValues) -> Self {
        value.clone()
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

// 64-bit unsigned and pointer-sized integers only fit `Int` when in range.
macro_rules! impl_try_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for RowValues {
                type Error = PgExecError;

                fn try_from(value: $t) -> Result<Self, Self::Error> {
                    i64::try_from(value).map(RowValues::Int).map_err(|_| {
                        PgExecError::ParameterError(format!(
                            "{value} does not fit a 64-bit signed integer"
                        ))
                    })
                }
            }
        )*
    };
}

impl_try_from_wide_int!(u64, usize, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_integers_convert_when_in_range() {
        assert_eq!(RowValues::try_from(42_u64).unwrap(), RowValues::Int(42));
        assert_eq!(RowValues::try_from(7_usize).unwrap(), RowValues::Int(7));
        assert_eq!(RowValues::try_from(-7_isize).unwrap(), RowValues::Int(-7));

        let err = RowValues::try_from(u64::MAX).unwrap_err();
        assert!(matches!(err, PgExecError::ParameterError(_)));
        assert!(err.to_string().contains("18446744073709551615"));
    }

    #[test]
    fn dates_and_arrays_name_their_kind() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(RowValues::from(day).kind(), "date");
        let tags = RowValues::TextArray(vec![Some("a".into()), None]);
        assert_eq!(tags.kind(), "text[]");
    }
}

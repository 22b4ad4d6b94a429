use std::error::Error;
use std::pin::Pin;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::TryStreamExt;
use serde_json::Value;
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::{Row, RowStream};

use crate::error::PgExecError;
use crate::results::{FetchedRow, RowCursor};
use crate::types::RowValues;

/// Text carried by the client's string types and by enum labels, whose binary
/// form is the label itself.
struct TextLike(String);

impl<'a> FromSql<'a> for TextLike {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if matches!(ty.kind(), Kind::Enum(_)) {
            return Ok(TextLike(std::str::from_utf8(raw)?.to_string()));
        }
        String::from_sql(ty, raw).map(TextLike)
    }

    fn accepts(ty: &Type) -> bool {
        <String as FromSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_))
    }
}

/// `numeric` rendered as its exact decimal text.
struct NumericText(String);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let word = |at: usize| -> Result<[u8; 2], Box<dyn Error + Sync + Send>> {
            raw.get(at..at + 2)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| "truncated numeric value".into())
        };
        let ndigits = usize::try_from(i16::from_be_bytes(word(0)?))?;
        let weight = i32::from(i16::from_be_bytes(word(2)?));
        let sign = u16::from_be_bytes(word(4)?);
        let dscale = usize::from(u16::from_be_bytes(word(6)?));
        let digits = (0..ndigits)
            .map(|i| word(8 + 2 * i).map(i16::from_be_bytes))
            .collect::<Result<Vec<_>, _>>()?;

        match sign {
            NUMERIC_NAN => return Ok(NumericText("NaN".into())),
            NUMERIC_PINF => return Ok(NumericText("Infinity".into())),
            NUMERIC_NINF => return Ok(NumericText("-Infinity".into())),
            _ => {}
        }

        // digit i is worth 10000^(weight - i)
        let digit_at = |power: i32| -> i16 {
            usize::try_from(weight - power)
                .ok()
                .and_then(|i| digits.get(i).copied())
                .unwrap_or(0)
        };

        let mut text = String::new();
        if sign == NUMERIC_NEG {
            text.push('-');
        }
        if weight < 0 {
            text.push('0');
        } else {
            text.push_str(&digit_at(weight).to_string());
            for power in (0..weight).rev() {
                text.push_str(&format!("{:04}", digit_at(power)));
            }
        }
        if dscale > 0 {
            let mut fraction = String::new();
            let mut power = -1;
            while fraction.len() < dscale {
                fraction.push_str(&format!("{:04}", digit_at(power)));
                power -= 1;
            }
            fraction.truncate(dscale);
            text.push('.');
            text.push_str(&fraction);
        }
        Ok(NumericText(text))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// `numeric` columns come back as exact decimal text and `timestamptz` as UTC
/// wall time.
///
/// # Errors
/// Returns `PgExecError` if the column cannot be decoded.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, PgExecError> {
    let type_info = row.columns()[idx].type_();

    let value = match *type_info {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)?
            .map_or(RowValues::Null, RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map_or(RowValues::Null, RowValues::Real),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)?
            .map_or(RowValues::Null, RowValues::Float),
        Type::NUMERIC => row
            .try_get::<_, Option<NumericText>>(idx)?
            .map_or(RowValues::Null, |n| RowValues::Text(n.0)),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map_or(RowValues::Null, RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map_or(RowValues::Null, RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map_or(RowValues::Null, |ts| RowValues::Timestamp(ts.naive_utc())),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map_or(RowValues::Null, RowValues::Date),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)?
            .map_or(RowValues::Null, RowValues::JSON),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(RowValues::Null, RowValues::Blob),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY | Type::NAME_ARRAY => row
            .try_get::<_, Option<Vec<Option<String>>>>(idx)?
            .map_or(RowValues::Null, RowValues::TextArray),
        // text-like types and enums; anything else fails to decode
        _ => row
            .try_get::<_, Option<TextLike>>(idx)?
            .map_or(RowValues::Null, |t| RowValues::Text(t.0)),
    };
    Ok(value)
}

/// Extract every column of `row`, in column order. A column that fails to
/// decode is kept on the row as a deferred scan error.
#[must_use]
pub fn extract_row(row: &Row) -> FetchedRow {
    let mut values = Vec::with_capacity(row.columns().len());
    let mut failures = Vec::new();
    for (idx, column) in row.columns().iter().enumerate() {
        match postgres_extract_value(row, idx) {
            Ok(value) => values.push(value),
            Err(e) => {
                tracing::debug!(column = column.name(), error = %e, "column left undecoded");
                values.push(RowValues::Null);
                failures.push((idx, format!("{} ({})", column.type_(), e)));
            }
        }
    }
    failures
        .into_iter()
        .fold(FetchedRow::new(values), |row, (idx, message)| {
            row.with_undecodable(idx, message)
        })
}

/// Streaming rows of one Postgres query. Rows are decoded as they are pulled.
pub struct PgRows {
    stream: Option<Pin<Box<RowStream>>>,
}

impl PgRows {
    pub(crate) fn new(stream: RowStream) -> Self {
        Self {
            stream: Some(Box::pin(stream)),
        }
    }
}

impl RowCursor for PgRows {
    async fn next_row(&mut self) -> Result<Option<FetchedRow>, PgExecError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let next = stream.try_next().await?;
        match next {
            Some(row) => Ok(Some(extract_row(&row))),
            None => {
                self.stream = None;
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<(), PgExecError> {
        // dropping the stream discards whatever the server has not sent yet
        self.stream = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_bytes(weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&i16::try_from(digits.len()).unwrap().to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for digit in digits {
            raw.extend_from_slice(&digit.to_be_bytes());
        }
        raw
    }

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> String {
        let raw = numeric_bytes(weight, sign, dscale, digits);
        NumericText::from_sql(&Type::NUMERIC, &raw).unwrap().0
    }

    #[test]
    fn numeric_renders_exact_decimal_text() {
        assert_eq!(numeric(0, 0, 1, &[1, 5000]), "1.5");
        assert_eq!(numeric(1, NUMERIC_NEG, 3, &[1, 2345, 6780]), "-12345.678");
        assert_eq!(numeric(-1, 0, 4, &[1]), "0.0001");
        assert_eq!(numeric(0, 0, 0, &[]), "0");
        assert_eq!(numeric(0, 0, 2, &[]), "0.00");
        assert_eq!(numeric(2, 0, 0, &[1]), "100000000");
        assert_eq!(numeric(0, NUMERIC_NAN, 0, &[]), "NaN");
        assert_eq!(numeric(0, NUMERIC_NINF, 0, &[]), "-Infinity");
    }

    #[test]
    fn truncated_numeric_is_an_error() {
        let mut raw = numeric_bytes(0, 0, 1, &[1, 5000]);
        raw.truncate(raw.len() - 1);
        assert!(NumericText::from_sql(&Type::NUMERIC, &raw).is_err());
    }

    #[test]
    fn enum_labels_decode_as_text() {
        let mood = Type::new(
            "mood".into(),
            0,
            Kind::Enum(vec!["happy".into()]),
            "public".into(),
        );
        assert!(<TextLike as FromSql>::accepts(&mood));
        assert!(<TextLike as FromSql>::accepts(&Type::VARCHAR));
        assert!(!<TextLike as FromSql>::accepts(&Type::INTERVAL));
        assert_eq!(TextLike::from_sql(&mood, b"happy").unwrap().0, "happy");
    }

    #[test]
    fn text_arrays_decode_with_null_elements() {
        let mut buf = tokio_util::bytes::BytesMut::new();
        let tags = vec![Some("a".to_string()), None];
        tokio_postgres::types::ToSql::to_sql(&tags, &Type::TEXT_ARRAY, &mut buf).unwrap();
        let decoded = Vec::<Option<String>>::from_sql(&Type::TEXT_ARRAY, &buf[..]).unwrap();
        assert_eq!(RowValues::TextArray(decoded), RowValues::TextArray(tags));
    }
}

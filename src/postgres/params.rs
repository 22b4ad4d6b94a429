use std::error::Error;

use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed view of `RowValues` in the shape tokio-postgres binds.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// Convert a slice of `RowValues` into Postgres parameter references.
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let references = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

// Largest magnitudes whose every integer is exactly representable.
const F64_EXACT_INT: u64 = 1 << f64::MANTISSA_DIGITS;
const F32_EXACT_INT: u64 = 1 << f32::MANTISSA_DIGITS;

fn mismatch(value: &RowValues, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind {} value to a {ty} parameter", value.kind()).into()
}

fn text_accepts(ty: &Type) -> bool {
    <String as ToSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_))
}

impl ToSql for RowValues {
    /// Encode `self` for a parameter of type `ty`.
    ///
    /// Integers narrow to `int2`/`int4` with a range check and widen to floats
    /// only when exact; `float8` narrows to `float4` unless it overflows. Any
    /// other pairing of value and parameter type is an error.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Null => Ok(IsNull::Yes),
            // narrow to the column width; tokio-postgres writes the Rust width as-is
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::FLOAT4 if i.unsigned_abs() <= F32_EXACT_INT => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 if i.unsigned_abs() <= F64_EXACT_INT => (*i as f64).to_sql(ty, out),
                Type::FLOAT4 | Type::FLOAT8 => {
                    Err(format!("integer {i} is not exactly representable as {ty}").into())
                }
                _ => Err(mismatch(self, ty)),
            },
            RowValues::Float(f) => match *ty {
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::FLOAT4 => {
                    let narrow = *f as f32;
                    if f.is_finite() && narrow.is_infinite() {
                        return Err(format!("{f} is out of range for float4").into());
                    }
                    narrow.to_sql(ty, out)
                }
                _ => Err(mismatch(self, ty)),
            },
            RowValues::Real(f) => match *ty {
                Type::FLOAT4 => f.to_sql(ty, out),
                Type::FLOAT8 => f64::from(*f).to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            RowValues::Text(s) if <String as ToSql>::accepts(ty) => s.to_sql(ty, out),
            // enum labels travel as their text
            RowValues::Text(s) if text_accepts(ty) => {
                out.extend_from_slice(s.as_bytes());
                Ok(IsNull::No)
            }
            RowValues::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMP => dt.to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            RowValues::Date(d) if *ty == Type::DATE => d.to_sql(ty, out),
            RowValues::JSON(jsval) if matches!(*ty, Type::JSON | Type::JSONB) => {
                jsval.to_sql(ty, out)
            }
            RowValues::Blob(bytes) if *ty == Type::BYTEA => bytes.to_sql(ty, out),
            RowValues::TextArray(items) if <Vec<Option<String>> as ToSql>::accepts(ty) => {
                items.to_sql(ty, out)
            }
            _ => Err(mismatch(self, ty)),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        ) || text_accepts(ty)
            || <Vec<Option<String>> as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use tokio_postgres::types::FromSql;

    use super::*;

    fn encode(value: &RowValues, ty: &Type) -> Result<Vec<u8>, Box<dyn Error + Sync + Send>> {
        let mut buf = bytes::BytesMut::new();
        match value.to_sql_checked(ty, &mut buf)? {
            IsNull::Yes => Ok(Vec::new()),
            IsNull::No => Ok(buf.to_vec()),
        }
    }

    #[test]
    fn integers_narrow_to_the_column_width() {
        let raw = encode(&RowValues::Int(7), &Type::INT2).unwrap();
        assert_eq!(i16::from_sql(&Type::INT2, &raw).unwrap(), 7);

        let raw = encode(&RowValues::Int(-40_000), &Type::INT4).unwrap();
        assert_eq!(i32::from_sql(&Type::INT4, &raw).unwrap(), -40_000);

        let raw = encode(&RowValues::Int(i64::MAX), &Type::INT8).unwrap();
        assert_eq!(i64::from_sql(&Type::INT8, &raw).unwrap(), i64::MAX);

        assert!(encode(&RowValues::Int(70_000), &Type::INT2).is_err());
        assert!(encode(&RowValues::Int(i64::from(i32::MAX) + 1), &Type::INT4).is_err());
    }

    #[test]
    fn integers_widen_to_floats_only_when_exact() {
        let raw = encode(&RowValues::Int(3), &Type::FLOAT8).unwrap();
        assert_eq!(f64::from_sql(&Type::FLOAT8, &raw).unwrap(), 3.0);

        let raw = encode(&RowValues::Int(-16), &Type::FLOAT4).unwrap();
        assert_eq!(f32::from_sql(&Type::FLOAT4, &raw).unwrap(), -16.0);

        assert!(encode(&RowValues::Int((1 << 53) + 1), &Type::FLOAT8).is_err());
        assert!(encode(&RowValues::Int((1 << 24) + 1), &Type::FLOAT4).is_err());
    }

    #[test]
    fn floats_change_width() {
        let raw = encode(&RowValues::Float(1.5), &Type::FLOAT4).unwrap();
        assert_eq!(f32::from_sql(&Type::FLOAT4, &raw).unwrap(), 1.5);

        let raw = encode(&RowValues::Real(2.5), &Type::FLOAT8).unwrap();
        assert_eq!(f64::from_sql(&Type::FLOAT8, &raw).unwrap(), 2.5);

        let raw = encode(&RowValues::Float(f64::NAN), &Type::FLOAT4).unwrap();
        assert!(f32::from_sql(&Type::FLOAT4, &raw).unwrap().is_nan());

        assert!(encode(&RowValues::Float(1e300), &Type::FLOAT4).is_err());
    }

    #[test]
    fn mismatched_values_are_rejected() {
        let err = encode(&RowValues::Float(1.0), &Type::INT8).unwrap_err();
        assert_eq!(err.to_string(), "cannot bind float8 value to a int8 parameter");

        assert!(encode(&RowValues::Text("abcd".into()), &Type::INT4).is_err());
        assert!(encode(&RowValues::Int(1), &Type::TEXT).is_err());
        assert!(encode(&RowValues::Bool(true), &Type::INT4).is_err());
        assert!(encode(&RowValues::Blob(vec![1, 2]), &Type::TEXT).is_err());
        assert!(encode(&RowValues::Int(1), &Type::NUMERIC).is_err());
    }

    #[test]
    fn null_binds_to_any_accepted_type() {
        for ty in [Type::INT4, Type::TEXT, Type::BYTEA, Type::TEXT_ARRAY] {
            let mut buf = bytes::BytesMut::new();
            let is_null = RowValues::Null.to_sql_checked(&ty, &mut buf).unwrap();
            assert!(matches!(is_null, IsNull::Yes));
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn text_dates_and_arrays_round_trip() {
        let raw = encode(&RowValues::Text("abcd".into()), &Type::VARCHAR).unwrap();
        assert_eq!(String::from_sql(&Type::VARCHAR, &raw).unwrap(), "abcd");

        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let raw = encode(&RowValues::Date(day), &Type::DATE).unwrap();
        assert_eq!(NaiveDate::from_sql(&Type::DATE, &raw).unwrap(), day);

        let at = day.and_hms_opt(12, 30, 0).unwrap();
        let raw = encode(&RowValues::Timestamp(at), &Type::TIMESTAMPTZ).unwrap();
        let decoded = DateTime::<Utc>::from_sql(&Type::TIMESTAMPTZ, &raw).unwrap();
        assert_eq!(decoded.naive_utc(), at);

        let tags = vec![Some("a".to_string()), None, Some("b".to_string())];
        let raw = encode(&RowValues::TextArray(tags.clone()), &Type::TEXT_ARRAY).unwrap();
        assert_eq!(
            Vec::<Option<String>>::from_sql(&Type::TEXT_ARRAY, &raw).unwrap(),
            tags
        );
    }

    #[test]
    fn text_binds_to_enum_labels() {
        let mood = Type::new(
            "mood".into(),
            0,
            Kind::Enum(vec!["happy".into(), "sad".into()]),
            "public".into(),
        );
        let raw = encode(&RowValues::Text("sad".into()), &mood).unwrap();
        assert_eq!(raw, b"sad");
    }
}

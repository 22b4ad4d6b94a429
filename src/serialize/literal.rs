use crate::types::RowValues;

/// Render a value as an inline SQL literal.
///
/// | value | literal |
/// |-------|---------|
/// | `Null` | `NULL` |
/// | text | `'text'` (embedded quotes are not escaped) |
/// | integer | `-3` |
/// | float | shortest round-trip decimal, never exponent notation (`-3.2`, `0.0000001`) |
/// | non-finite float | `'NaN'`, `'Infinity'`, `'-Infinity'` |
/// | boolean | `true` / `false` |
///
/// ```rust
/// use pgexec::prelude::*;
///
/// assert_eq!(serialize("test string"), "'test string'");
/// assert_eq!(serialize(34), "34");
/// assert_eq!(serialize(-3.2), "-3.2");
/// assert_eq!(serialize(true), "true");
/// assert_eq!(serialize(RowValues::Null), "NULL");
/// ```
///
/// # Panics
/// Panics on timestamp, date, JSON, binary, and array values. Those have no literal form here;
/// reaching this branch is a bug at the call site, so bind them with a
/// [`Serializer`](crate::serialize::Serializer) placeholder instead.
#[must_use]
pub fn serialize(value: impl Into<RowValues>) -> String {
    match value.into() {
        RowValues::Null => "NULL".to_string(),
        // TODO: escape embedded single quotes; they are emitted verbatim today
        RowValues::Text(s) => format!("'{s}'"),
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) => float_literal(f),
        RowValues::Real(f) => float_literal(f),
        RowValues::Bool(b) => b.to_string(),
        other => panic!("tried to serialize unsupported {} value", other.kind()),
    }
}

/// Render a list of strings as a Postgres array literal: `ARRAY['a','b']`.
///
/// An empty slice yields `ARRAY[]`.
#[must_use]
pub fn serialize_string_array<S: AsRef<str>>(items: &[S]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| {
            let text: &str = item.as_ref();
            serialize(text)
        })
        .collect();
    format!("ARRAY[{}]", elements.join(","))
}

// `Display` for floats is already the shortest round-trip form without exponents;
// only the non-finite values need Postgres spelling.
fn float_literal<F>(f: F) -> String
where
    F: std::fmt::Display + Into<f64> + Copy,
{
    let wide: f64 = f.into();
    if wide.is_nan() {
        "'NaN'".to_string()
    } else if wide.is_infinite() {
        if wide > 0.0 {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn serializes_scalars() {
        assert_eq!(serialize("test string"), "'test string'");
        assert_eq!(serialize(34), "34");
        assert_eq!(serialize(0), "0");
        assert_eq!(serialize(-3), "-3");
        assert_eq!(serialize(i64::MIN), "-9223372036854775808");
        assert_eq!(serialize(-3.2), "-3.2");
        assert_eq!(serialize(3.2), "3.2");
        assert_eq!(serialize(false), "false");
        assert_eq!(serialize(true), "true");
        assert_eq!(serialize(RowValues::Null), "NULL");
        assert_eq!(serialize(None::<&str>), "NULL");
    }

    #[test]
    fn floats_use_shortest_form_without_exponent() {
        assert_eq!(serialize(3.0_f64), "3");
        assert_eq!(serialize(0.1_f64 + 0.2_f64), "0.30000000000000004");
        assert_eq!(serialize(1e-7_f64), "0.0000001");
        assert_eq!(serialize(1e21_f64), "1000000000000000000000");
        assert_eq!(serialize(3.2_f32), "3.2");
        assert_eq!(serialize(-0.5_f32), "-0.5");
    }

    #[test]
    fn non_finite_floats_use_postgres_spelling() {
        assert_eq!(serialize(f64::NAN), "'NaN'");
        assert_eq!(serialize(f64::INFINITY), "'Infinity'");
        assert_eq!(serialize(f32::NEG_INFINITY), "'-Infinity'");
    }

    #[test]
    fn quotes_are_not_escaped() {
        assert_eq!(serialize("it's"), "'it's'");
    }

    #[test]
    fn string_arrays() {
        let empty: [&str; 0] = [];
        assert_eq!(serialize_string_array(&empty), "ARRAY[]");
        assert_eq!(serialize_string_array(&["a", "b"]), "ARRAY['a','b']");
        assert_eq!(
            serialize_string_array(&["only".to_string()]),
            "ARRAY['only']"
        );
    }

    #[test]
    #[should_panic(expected = "unsupported timestamp value")]
    fn timestamp_panics() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let _ = serialize(ts);
    }

    #[test]
    #[should_panic(expected = "unsupported bytea value")]
    fn blob_panics() {
        let _ = serialize(vec![0_u8, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "unsupported json value")]
    fn json_panics() {
        let _ = serialize(serde_json::json!({"a": 1}));
    }

    #[test]
    #[should_panic(expected = "unsupported text[] value")]
    fn text_array_panics() {
        let _ = serialize(RowValues::TextArray(vec![Some("a".into())]));
    }
}

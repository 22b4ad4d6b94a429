use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::PgExecError;
use crate::types::RowValues;

use super::cursor::FetchedRow;

/// A destination that one column of the current row can be scanned into.
///
/// NULL only scans into `Option<T>` or `RowValues`; everything else reports a
/// [`PgExecError::ScanError`] naming the column.
pub trait ScanTarget {
    /// Overwrite `self` with the column value.
    ///
    /// # Errors
    /// Returns `PgExecError::ScanError` when the value does not fit the target type.
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError>;
}

/// Scan function handed to [`Deserializable::from_row`]. It takes one target per
/// column, in column order.
pub type ScannerFunction<'a> =
    dyn FnMut(&mut [&mut dyn ScanTarget]) -> Result<(), PgExecError> + 'a;

/// Types that can populate themselves from a result row.
///
/// The implementation decides column order and types:
/// ```rust
/// use pgexec::prelude::*;
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl Deserializable for User {
///     fn from_row(&mut self, scan: &mut ScannerFunction<'_>) -> Result<(), PgExecError> {
///         scan(&mut [&mut self.id, &mut self.name, &mut self.email])
///     }
/// }
/// ```
pub trait Deserializable {
    /// Fill `self` from the current row by calling `scan` with field targets.
    ///
    /// # Errors
    /// Returns whatever `scan` reports, or an error of the implementation's own.
    fn from_row(&mut self, scan: &mut ScannerFunction<'_>) -> Result<(), PgExecError>;
}

/// Scan `row` into `targets`, which must have exactly one entry per column.
///
/// # Errors
/// Returns `PgExecError::ScanError` on a count mismatch or the first column that
/// fails to convert.
pub fn scan_row(row: &[RowValues], targets: &mut [&mut dyn ScanTarget]) -> Result<(), PgExecError> {
    if row.len() != targets.len() {
        return Err(PgExecError::ScanError {
            column: targets.len().min(row.len()),
            message: format!(
                "expected {} destination arguments in scan, got {}",
                row.len(),
                targets.len()
            ),
        });
    }
    for (column, (value, target)) in row.iter().zip(targets.iter_mut()).enumerate() {
        target.scan_value(column, value)?;
    }
    Ok(())
}

/// Build the scan function for one fetched row. Undecodable columns fail
/// when their target is reached.
pub(crate) fn scanner(
    row: &FetchedRow,
) -> impl FnMut(&mut [&mut dyn ScanTarget]) -> Result<(), PgExecError> + '_ {
    move |targets: &mut [&mut dyn ScanTarget]| {
        let values = row.values();
        if values.len() != targets.len() {
            return scan_row(values, targets);
        }
        for (column, (value, target)) in values.iter().zip(targets.iter_mut()).enumerate() {
            if let Some(message) = row.decode_error(column) {
                return Err(PgExecError::scan(
                    column,
                    format!("cannot decode column: {message}"),
                ));
            }
            target.scan_value(column, value)?;
        }
        Ok(())
    }
}

fn mismatch(column: usize, value: &RowValues, target: &str) -> PgExecError {
    if value.is_null() {
        PgExecError::scan(column, format!("converting NULL to {target} is unsupported"))
    } else {
        PgExecError::scan(
            column,
            format!("cannot scan {} value into {target}", value.kind()),
        )
    }
}

impl ScanTarget for RowValues {
    fn scan_value(&mut self, _column: usize, value: &RowValues) -> Result<(), PgExecError> {
        self.clone_from(value);
        Ok(())
    }
}

impl ScanTarget for i64 {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Int(i) => {
                *self = *i;
                Ok(())
            }
            other => Err(mismatch(column, other, "i64")),
        }
    }
}

macro_rules! impl_scan_narrow_int {
    ($($t:ty),*) => {
        $(
            impl ScanTarget for $t {
                fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
                    match value {
                        RowValues::Int(i) => {
                            *self = <$t>::try_from(*i).map_err(|_| {
                                PgExecError::scan(
                                    column,
                                    format!("value {i} out of range for {}", stringify!($t)),
                                )
                            })?;
                            Ok(())
                        }
                        other => Err(mismatch(column, other, stringify!($t))),
                    }
                }
            }
        )*
    };
}

impl_scan_narrow_int!(i32, i16);

impl ScanTarget for f64 {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value.as_float() {
            Some(f) => {
                *self = f;
                Ok(())
            }
            None => Err(mismatch(column, value, "f64")),
        }
    }
}

impl ScanTarget for f32 {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Real(f) => {
                *self = *f;
                Ok(())
            }
            other => Err(mismatch(column, other, "f32")),
        }
    }
}

impl ScanTarget for bool {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Bool(b) => {
                *self = *b;
                Ok(())
            }
            other => Err(mismatch(column, other, "bool")),
        }
    }
}

impl ScanTarget for String {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Text(s) => {
                self.clone_from(s);
                Ok(())
            }
            other => Err(mismatch(column, other, "String")),
        }
    }
}

impl ScanTarget for NaiveDateTime {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Timestamp(ts) => {
                *self = *ts;
                Ok(())
            }
            other => Err(mismatch(column, other, "NaiveDateTime")),
        }
    }
}

impl ScanTarget for NaiveDate {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Date(d) => {
                *self = *d;
                Ok(())
            }
            other => Err(mismatch(column, other, "NaiveDate")),
        }
    }
}

impl ScanTarget for Vec<Option<String>> {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::TextArray(items) => {
                self.clone_from(items);
                Ok(())
            }
            other => Err(mismatch(column, other, "Vec<Option<String>>")),
        }
    }
}

impl ScanTarget for Vec<String> {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::TextArray(items) => {
                *self = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.clone().ok_or_else(|| {
                            PgExecError::scan(column, format!("array element {i} is NULL"))
                        })
                    })
                    .collect::<Result<_, _>>()?;
                Ok(())
            }
            other => Err(mismatch(column, other, "Vec<String>")),
        }
    }
}

impl ScanTarget for JsonValue {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::JSON(json) => {
                self.clone_from(json);
                Ok(())
            }
            other => Err(mismatch(column, other, "serde_json::Value")),
        }
    }
}

impl ScanTarget for Vec<u8> {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        match value {
            RowValues::Blob(bytes) => {
                self.clone_from(bytes);
                Ok(())
            }
            other => Err(mismatch(column, other, "Vec<u8>")),
        }
    }
}

impl<T: ScanTarget + Default> ScanTarget for Option<T> {
    fn scan_value(&mut self, column: usize, value: &RowValues) -> Result<(), PgExecError> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.scan_value(column, value)?;
        *self = Some(inner);
        Ok(())
    }
}

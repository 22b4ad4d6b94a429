use crate::query::QueryAndParams;
use crate::types::RowValues;

/// Collects bound parameter values and hands out matching `$n` placeholders.
///
/// The n-th placeholder returned by [`Serializer::add`] always refers to the n-th
/// entry of [`Serializer::params`]:
/// ```rust
/// use pgexec::prelude::*;
///
/// let mut s = Serializer::new();
/// let sql = format!(
///     "INSERT INTO users (name, active) VALUES ({}, {})",
///     s.add("alice"),
///     s.add(true),
/// );
/// assert_eq!(sql, "INSERT INTO users (name, active) VALUES ($1, $2)");
/// assert_eq!(s.params(), &[RowValues::Text("alice".into()), RowValues::Bool(true)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    params: Vec<RowValues>,
}

impl Serializer {
    #[must_use]
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a parameter and return its 1-based placeholder. Equal values are
    /// not deduplicated.
    pub fn add(&mut self, value: impl Into<RowValues>) -> String {
        self.params.push(value.into());
        format!("${}", self.params.len())
    }

    /// Parameters in the order they were added.
    #[must_use]
    pub fn params(&self) -> &[RowValues] {
        &self.params
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[must_use]
    pub fn into_params(self) -> Vec<RowValues> {
        self.params
    }

    /// Pair the collected parameters with the SQL that references them.
    pub fn into_query(self, query: impl Into<String>) -> QueryAndParams {
        QueryAndParams::new(query, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_call_order() {
        let mut s = Serializer::new();
        assert!(s.is_empty());
        let placeholders: Vec<String> = (0..12).map(|i| s.add(i * 10)).collect();

        for (k, p) in placeholders.iter().enumerate() {
            assert_eq!(p, &format!("${}", k + 1));
        }
        assert_eq!(s.len(), 12);
        assert_eq!(s.params()[0], RowValues::Int(0));
        assert_eq!(s.params()[11], RowValues::Int(110));
    }

    #[test]
    fn identical_values_are_kept_twice() {
        let mut s = Serializer::new();
        assert_eq!(s.add("x"), "$1");
        assert_eq!(s.add("x"), "$2");
        assert_eq!(
            s.into_params(),
            vec![RowValues::Text("x".into()), RowValues::Text("x".into())]
        );
    }

    #[test]
    fn into_query_keeps_alignment() {
        let mut s = Serializer::new();
        let sql = format!("SELECT * FROM t WHERE a = {} AND b IS {}", s.add(1.5), s.add(None::<i32>));
        let qp = s.into_query(sql);
        assert_eq!(qp.query, "SELECT * FROM t WHERE a = $1 AND b IS $2");
        assert_eq!(qp.params, vec![RowValues::Float(1.5), RowValues::Null]);
    }
}

// Serialization module - turns values into SQL text
//
// - literal: values rendered inline as SQL literals (`'text'`, `3.2`, `NULL`, `ARRAY[...]`)
// - params: positional `$n` placeholders with out-of-band parameter values

pub mod literal;
pub mod params;

pub use literal::{serialize, serialize_string_array};
pub use params::Serializer;

/// Types that can be written into the database by rendering their own insert SQL.
///
/// Implementations usually build the statement with [`serialize`]:
/// ```rust
/// use pgexec::prelude::*;
///
/// struct Tag {
///     name: String,
///     aliases: Vec<String>,
/// }
///
/// impl Serializable for Tag {
///     fn generate_insert_sql(&self) -> String {
///         format!(
///             "INSERT INTO tags (name, aliases) VALUES ({}, {})",
///             serialize(self.name.as_str()),
///             serialize_string_array(&self.aliases),
///         )
///     }
/// }
///
/// let tag = Tag { name: "rust".into(), aliases: vec!["rs".into()] };
/// assert_eq!(
///     tag.generate_insert_sql(),
///     "INSERT INTO tags (name, aliases) VALUES ('rust', ARRAY['rs'])"
/// );
/// ```
pub trait Serializable {
    /// Generate the SQL used to insert this value into the database.
    fn generate_insert_sql(&self) -> String;
}

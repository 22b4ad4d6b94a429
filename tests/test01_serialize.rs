use pgexec::prelude::*;

fn check(value: impl Into<RowValues>, expected: &str, description: &str) {
    let literal = serialize(value);
    assert_eq!(
        literal, expected,
        "the {description} did not serialize correctly"
    );
}

#[test]
fn literals_match_format_rules() {
    check("test string", "'test string'", "string");
    check(34, "34", "integer");
    check(0, "0", "integer");
    check(-3, "-3", "integer");
    check(-3.2, "-3.2", "float");
    check(3.2, "3.2", "float");
    check(1.25_f32, "1.25", "float4");
    check(false, "false", "boolean");
    check(true, "true", "boolean");
    check(RowValues::Null, "NULL", "null");
    check(None::<i64>, "NULL", "empty option");
    check(Some("x"), "'x'", "present option");
}

#[test]
fn string_arrays_use_array_syntax() {
    let none: Vec<String> = Vec::new();
    assert_eq!(serialize_string_array(&none), "ARRAY[]");
    assert_eq!(serialize_string_array(&["a", "b"]), "ARRAY['a','b']");
    assert_eq!(serialize_string_array(&["a b", ""]), "ARRAY['a b','']");
}

#[test]
fn unsupported_values_panic() {
    let outcome = std::panic::catch_unwind(|| serialize(RowValues::Blob(vec![1, 2, 3])));
    assert!(outcome.is_err());
}

#[test]
fn kth_placeholder_matches_kth_param() {
    for n in [0_usize, 1, 2, 9, 10, 25] {
        let mut s = Serializer::new();
        for k in 1..=n {
            let value = format!("v{k}");
            assert_eq!(s.add(value), format!("${k}"));
        }
        assert_eq!(s.params().len(), n);
        for (k, param) in s.params().iter().enumerate() {
            assert_eq!(param.as_text(), Some(format!("v{}", k + 1).as_str()));
        }
    }
}

struct Book {
    title: String,
    year: i32,
    rating: Option<f64>,
    tags: Vec<String>,
}

impl Serializable for Book {
    fn generate_insert_sql(&self) -> String {
        format!(
            "INSERT INTO books (title, year, rating, tags) VALUES ({}, {}, {}, {})",
            serialize(self.title.as_str()),
            serialize(self.year),
            serialize(self.rating),
            serialize_string_array(&self.tags),
        )
    }
}

#[test]
fn serializable_builds_insert_text() {
    let book = Book {
        title: "Dune".into(),
        year: 1965,
        rating: None,
        tags: vec!["scifi".into(), "classic".into()],
    };
    assert_eq!(
        book.generate_insert_sql(),
        "INSERT INTO books (title, year, rating, tags) VALUES ('Dune', 1965, NULL, ARRAY['scifi','classic'])"
    );
}

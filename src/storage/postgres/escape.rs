//! String-literal escaping for PostgreSQL.

use crate::query::Escaper;

/// Escapes text for embedding between single quotes, following the
/// connection's `standard_conforming_strings` setting.
#[derive(Debug, Clone, Copy)]
pub struct PostgresEscaper {
    standard_conforming_strings: bool,
}

impl PostgresEscaper {
    pub fn new(standard_conforming_strings: bool) -> Self {
        Self {
            standard_conforming_strings,
        }
    }
}

impl Default for PostgresEscaper {
    /// `standard_conforming_strings` has defaulted to `on` since 9.1.
    fn default() -> Self {
        Self::new(true)
    }
}

impl Escaper for PostgresEscaper {
    fn escape_literal(&self, value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\'' => escaped.push_str("''"),
                '\\' if !self.standard_conforming_strings => escaped.push_str("\\\\"),
                // NUL cannot appear in a PostgreSQL string; libpq stops at it too.
                '\0' => break,
                other => escaped.push(other),
            }
        }
        escaped
    }
}

//! Positional parameter accumulation for statements built at runtime.
//!
//! Multi-row statements (`VALUES (...), (...)`, `IN (...)`) are assembled as
//! text. Placeholder numbers come from the length of the bound value list, so
//! placeholder `?N` always refers to the N-th bound value and row order in the
//! generated SQL matches the order values were bound.

use rusqlite::types::Value;

/// Ordered list of bound values plus the placeholders handed out for them.
#[derive(Debug, Default)]
pub struct StatementParams {
    values: Vec<Value>,
}

impl StatementParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one value and returns its placeholder.
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("?{}", self.values.len())
    }

    /// Binds every value of one tuple and returns `(?a, ?b, ...)`.
    pub fn bind_tuple<I>(&mut self, values: I) -> String
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let placeholders = values
            .into_iter()
            .map(|value| self.bind(value))
            .collect::<Vec<_>>();
        format!("({})", placeholders.join(", "))
    }

    /// Consumes the builder, yielding values in placeholder order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::StatementParams;
    use rusqlite::types::Value;

    #[test]
    fn placeholders_follow_bind_order_across_tuples() {
        let mut params = StatementParams::new();
        let parent = params.bind(7_i64);
        let first = params.bind_tuple([Value::from("en".to_string()), Value::from(1_i64)]);
        let second = params.bind_tuple([Value::from("fr".to_string()), Value::from(2_i64)]);

        assert_eq!(parent, "?1");
        assert_eq!(first, "(?2, ?3)");
        assert_eq!(second, "(?4, ?5)");
        let values = params.into_values();
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], Value::Integer(7));
        assert_eq!(values[3], Value::Text("fr".to_string()));
        assert_eq!(values[4], Value::Integer(2));
    }

    #[test]
    fn empty_builder_has_no_values() {
        assert!(StatementParams::new().into_values().is_empty());
    }
}

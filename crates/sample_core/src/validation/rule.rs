//! Declarative field rules and the evaluator that interprets them.

use rust_decimal::Decimal;
use serde_json::Value;

/// One constraint attached to a request field.
///
/// `Min`/`Max`/`Len` measure characters for text, element count for
/// collections and the value itself for numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Min(Decimal),
    Max(Decimal),
    Len(usize),
    /// Collection elements must not share a value of the named sub-field.
    Unique(&'static str),
}

impl Rule {
    pub fn min(value: i64) -> Self {
        Self::Min(Decimal::from(value))
    }

    pub fn max(value: i64) -> Self {
        Self::Max(Decimal::from(value))
    }

    /// Name reported as the violation code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Len(_) => "len",
            Self::Unique(_) => "unique",
        }
    }

    /// Parameter reported as violation metadata.
    pub fn param(&self) -> Option<Value> {
        match self {
            Self::Required | Self::Unique(_) => None,
            Self::Min(limit) | Self::Max(limit) => Some(decimal_param(*limit)),
            Self::Len(len) => Some(Value::from(*len)),
        }
    }

    /// Evaluates the rule, returning `true` when the value satisfies it.
    ///
    /// # Panics
    /// Panics when the rule cannot apply to the value kind (e.g. `Len` on a
    /// number, `Unique` outside a collection). That is a rule-table bug,
    /// not an input error.
    pub fn check(&self, value: &FieldValue<'_>) -> bool {
        match (self, value) {
            (Self::Unique(field), _) => {
                panic!("rule `unique={field}` only applies through Validator::collection")
            }
            (Self::Required, FieldValue::OptionalText(None)) => false,
            (_, FieldValue::OptionalText(None)) => true,
            (_, FieldValue::OptionalText(Some(text))) => self.check(&FieldValue::Text(text)),
            (Self::Required, FieldValue::Text(text)) => !text.is_empty(),
            (Self::Required, FieldValue::Number(number)) => !number.is_zero(),
            (Self::Required, FieldValue::Items(count)) => *count > 0,
            (Self::Len(len), FieldValue::Text(text)) => text.chars().count() == *len,
            (Self::Len(len), FieldValue::Items(count)) => count == len,
            (Self::Len(_), FieldValue::Number(_)) => {
                panic!("rule `len` does not apply to numeric fields")
            }
            (Self::Min(limit), _) => value.measure() >= *limit,
            (Self::Max(limit), _) => value.measure() <= *limit,
        }
    }
}

/// Borrowed view of a field value, as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    OptionalText(Option<&'a str>),
    Number(Decimal),
    Items(usize),
}

impl FieldValue<'_> {
    pub fn integer(value: impl Into<i64>) -> Self {
        Self::Number(Decimal::from(value.into()))
    }

    fn measure(&self) -> Decimal {
        match self {
            Self::Text(text) => Decimal::from(text.chars().count()),
            Self::OptionalText(text) => Decimal::from(text.map_or(0, |text| text.chars().count())),
            Self::Number(number) => *number,
            Self::Items(count) => Decimal::from(*count),
        }
    }
}

fn decimal_param(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Ok(integer) = i64::try_from(value) {
            return Value::from(integer);
        }
    }
    f64::try_from(value)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value.normalize().to_string()))
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Rule};
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn text_rules_count_characters_not_bytes() {
        assert!(Rule::max(2).check(&FieldValue::Text("ñé")));
        assert!(Rule::Len(2).check(&FieldValue::Text("ñé")));
        assert!(!Rule::Len(2).check(&FieldValue::Text("eng")));
    }

    #[test]
    fn optional_text_only_fails_required_when_absent() {
        assert!(!Rule::Required.check(&FieldValue::OptionalText(None)));
        assert!(Rule::max(1).check(&FieldValue::OptionalText(None)));
        assert!(!Rule::max(1).check(&FieldValue::OptionalText(Some("ab"))));
    }

    #[test]
    fn numeric_bounds_compare_values() {
        let min = Rule::Min(Decimal::new(1, 2));
        assert!(!min.check(&FieldValue::Number(Decimal::ZERO)));
        assert!(min.check(&FieldValue::Number(Decimal::new(1, 2))));
        assert!(!Rule::max(100).check(&FieldValue::integer(101)));
    }

    #[test]
    fn params_render_as_json_numbers() {
        assert_eq!(Rule::max(100).param(), Some(json!(100)));
        assert_eq!(Rule::Min(Decimal::new(1, 2)).param(), Some(json!(0.01)));
        assert_eq!(Rule::Len(2).param(), Some(json!(2)));
        assert_eq!(Rule::Required.param(), None);
    }

    #[test]
    #[should_panic(expected = "does not apply to numeric fields")]
    fn len_on_number_is_a_rule_table_bug() {
        Rule::Len(2).check(&FieldValue::integer(3));
    }
}

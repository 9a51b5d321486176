//! Request normalization and rule-driven validation.
//!
//! # Responsibility
//! - Trim and canonicalize request text before any rule runs.
//! - Evaluate per-field rule lists and collect every violation at once.
//!
//! # Invariants
//! - Each field reports at most its first failing rule.
//! - A `unique` collection violation lifts the outcome status to 409.
//! - Normalization failures are never reported as user errors.

use crate::error::{FieldViolation, SampleError, SampleResult, STATUS_BAD_REQUEST, STATUS_CONFLICT};
use convert_case::{Case, Casing};
use log::error;
use std::collections::HashSet;
use thiserror::Error;

mod rule;

pub use rule::{FieldValue, Rule};

const POINTER_ROOT: &str = "/body";

/// Request shape that can normalize itself and declare its rules.
pub trait Validate {
    /// Canonicalizes the value in place before rules run.
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        Ok(())
    }

    fn rules(&self, validator: &mut Validator);
}

/// Exposes sub-field values that `unique` collection rules compare.
pub trait UniqueKey {
    fn unique_key(&self, field: &str) -> Option<String>;
}

#[derive(Debug, Error)]
#[error("cannot normalize `{field}`: {reason}")]
pub struct NormalizeError {
    pub field: &'static str,
    pub reason: String,
}

/// Accumulates violations while walking a request shape.
#[derive(Debug, Default)]
pub struct Validator {
    path: Vec<String>,
    violations: Vec<FieldViolation>,
    conflict: bool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks one scalar field; records the first rule that fails.
    pub fn field(&mut self, name: &str, value: FieldValue<'_>, rules: &[Rule]) {
        if let Some(rule) = rules.iter().find(|rule| !rule.check(&value)) {
            let pointer = self.pointer(&[name]);
            self.push(pointer, rule);
        }
    }

    /// Checks a collection field, then each element when the collection
    /// itself is valid.
    pub fn collection<T>(&mut self, name: &str, items: &[T], rules: &[Rule])
    where
        T: Validate + UniqueKey,
    {
        let size = FieldValue::Items(items.len());
        for rule in rules {
            match rule {
                &Rule::Unique(sub_field) => {
                    if has_duplicates(items, sub_field) {
                        let pointer = self.pointer(&[name, sub_field]);
                        self.conflict = true;
                        self.push(pointer, rule);
                        return;
                    }
                }
                other if !other.check(&size) => {
                    let pointer = self.pointer(&[name]);
                    self.push(pointer, other);
                    return;
                }
                _ => {}
            }
        }

        let depth = self.path.len();
        self.path.push(name.to_case(Case::Camel));
        for (index, item) in items.iter().enumerate() {
            self.path.push(index.to_string());
            item.rules(self);
            self.path.pop();
        }
        self.path.truncate(depth);
    }

    /// Ends the walk, failing when any rule was violated.
    pub fn finish(self) -> SampleResult<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        let status = if self.conflict {
            STATUS_CONFLICT
        } else {
            STATUS_BAD_REQUEST
        };
        Err(SampleError::ValidationFailed {
            status,
            violations: self.violations,
        })
    }

    fn pointer(&self, tail: &[&str]) -> String {
        let mut pointer = POINTER_ROOT.to_string();
        let segments = self
            .path
            .iter()
            .cloned()
            .chain(tail.iter().map(|segment| segment.to_case(Case::Camel)));
        for segment in segments {
            pointer.push('/');
            pointer.push_str(&segment);
        }
        pointer
    }

    fn push(&mut self, pointer: String, rule: &Rule) {
        self.violations.push(FieldViolation {
            pointer,
            code: rule.code(),
            param: rule.param(),
        });
    }
}

fn has_duplicates<T: UniqueKey>(items: &[T], field: &str) -> bool {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.unique_key(field))
        .any(|key| !seen.insert(key))
}

/// Normalizes `request` and checks its rules, returning it ready for storage.
pub fn validate<T: Validate>(mut request: T) -> SampleResult<T> {
    if let Err(err) = request.normalize() {
        error!("event=validate module=validation status=error error_code=normalize_failed error={err}");
        return Err(SampleError::Internal);
    }

    let mut validator = Validator::new();
    request.rules(&mut validator);
    validator.finish()?;
    Ok(request)
}

/// Trims surrounding whitespace in place.
pub fn trim_text(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trims in place and turns blank text into `None`.
pub fn trim_optional_text(value: &mut Option<String>) {
    if let Some(text) = value.as_mut() {
        trim_text(text);
        if text.is_empty() {
            *value = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        trim_optional_text, validate, FieldValue, NormalizeError, Rule, UniqueKey, Validate,
        Validator,
    };
    use crate::error::SampleError;
    use serde_json::json;

    #[derive(Debug)]
    struct Line {
        code: String,
        rank: i64,
    }

    impl Validate for Line {
        fn rules(&self, validator: &mut Validator) {
            validator.field("code", FieldValue::Text(&self.code), &[Rule::Len(2)]);
            validator.field("rank", FieldValue::integer(self.rank), &[Rule::min(1)]);
        }
    }

    impl UniqueKey for Line {
        fn unique_key(&self, field: &str) -> Option<String> {
            (field == "code").then(|| self.code.clone())
        }
    }

    #[derive(Debug)]
    struct Order {
        display_name: String,
        lines: Vec<Line>,
        fail_normalize: bool,
    }

    impl Validate for Order {
        fn normalize(&mut self) -> Result<(), NormalizeError> {
            if self.fail_normalize {
                return Err(NormalizeError {
                    field: "display_name",
                    reason: "broken".to_string(),
                });
            }
            self.display_name = self.display_name.trim().to_string();
            Ok(())
        }

        fn rules(&self, validator: &mut Validator) {
            validator.field(
                "display_name",
                FieldValue::Text(&self.display_name),
                &[Rule::Required, Rule::max(5)],
            );
            validator.collection(
                "order_lines",
                &self.lines,
                &[Rule::min(1), Rule::Unique("code")],
            );
        }
    }

    fn line(code: &str, rank: i64) -> Line {
        Line {
            code: code.to_string(),
            rank,
        }
    }

    fn order(name: &str, lines: Vec<Line>) -> Order {
        Order {
            display_name: name.to_string(),
            lines,
            fail_normalize: false,
        }
    }

    fn violations(err: SampleError) -> (u16, Vec<(String, &'static str)>) {
        match err {
            SampleError::ValidationFailed { status, violations } => (
                status,
                violations
                    .into_iter()
                    .map(|violation| (violation.pointer, violation.code))
                    .collect(),
            ),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_is_returned_normalized() {
        let request = validate(order("  abc ", vec![line("en", 1)])).unwrap();
        assert_eq!(request.display_name, "abc");
    }

    #[test]
    fn whitespace_only_required_text_fails_after_trim() {
        let err = validate(order("   ", vec![line("en", 1)])).unwrap_err();
        assert_eq!(
            violations(err),
            (400, vec![("/body/displayName".to_string(), "required")])
        );
    }

    #[test]
    fn nested_violations_carry_index_segments() {
        let err = validate(order("abc", vec![line("en", 1), line("fra", 0)])).unwrap_err();
        assert_eq!(
            violations(err),
            (
                400,
                vec![
                    ("/body/orderLines/1/code".to_string(), "len"),
                    ("/body/orderLines/1/rank".to_string(), "min"),
                ]
            )
        );
    }

    #[test]
    fn duplicate_keys_are_a_conflict_on_the_sub_field() {
        let err = validate(order("abc", vec![line("en", 1), line("en", 2)])).unwrap_err();
        assert_eq!(
            violations(err),
            (409, vec![("/body/orderLines/code".to_string(), "unique")])
        );
    }

    #[test]
    fn empty_collection_reports_min_with_param() {
        let err = validate(order("abc", Vec::new())).unwrap_err();
        let SampleError::ValidationFailed { violations, .. } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(violations[0].pointer, "/body/orderLines");
        assert_eq!(violations[0].param, Some(json!(1)));
    }

    #[test]
    fn normalize_failure_is_internal() {
        let mut request = order("abc", vec![line("en", 1)]);
        request.fail_normalize = true;
        assert_eq!(validate(request).unwrap_err(), SampleError::Internal);
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        let mut value = Some("   ".to_string());
        trim_optional_text(&mut value);
        assert_eq!(value, None);

        let mut value = Some(" x ".to_string());
        trim_optional_text(&mut value);
        assert_eq!(value.as_deref(), Some("x"));
    }
}

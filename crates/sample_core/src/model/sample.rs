//! Sample aggregate and its translation children.
//!
//! # Invariants
//! - `id`, `version` and the audit fields are assigned by storage only.
//! - `version` starts at 0 and grows by exactly one per successful write.
//! - Within one sample, translation languages and ordinals are unique.

use crate::model::page::Seekable;
use crate::validation::{
    trim_optional_text, trim_text, FieldValue, NormalizeError, Rule, UniqueKey, Validate,
    Validator,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Storage-assigned surrogate key.
pub type SampleId = i64;

/// Aggregate root as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: SampleId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Decimal,
    /// Optimistic concurrency token.
    pub version: i32,
    /// Attached on full reads; empty in list views.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Translation>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub created_by: String,
    /// Epoch milliseconds.
    pub last_modified_at: i64,
    pub last_modified_by: String,
}

impl Sample {
    /// Replaces root text with `translation`.
    pub(crate) fn localize(&mut self, translation: Translation) {
        self.name = translation.name;
        self.description = translation.description;
    }
}

impl Seekable for Sample {
    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Per-language text of a sample, keyed by `(sample id, language)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Two-letter language code.
    pub language: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display order, starting at 1.
    pub ordinal: i16,
}

impl Validate for Translation {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        trim_text(&mut self.language);
        self.language.make_ascii_lowercase();
        trim_text(&mut self.name);
        trim_optional_text(&mut self.description);
        Ok(())
    }

    fn rules(&self, validator: &mut Validator) {
        validator.field(
            "name",
            FieldValue::Text(&self.name),
            &[Rule::Required, Rule::max(100)],
        );
        validator.field(
            "description",
            FieldValue::OptionalText(self.description.as_deref()),
            &[Rule::max(200)],
        );
        validator.field("language", FieldValue::Text(&self.language), &[Rule::Len(2)]);
        validator.field(
            "ordinal",
            FieldValue::integer(self.ordinal),
            &[Rule::min(1), Rule::max(100)],
        );
    }
}

impl UniqueKey for Translation {
    fn unique_key(&self, field: &str) -> Option<String> {
        match field {
            "language" => Some(self.language.clone()),
            "ordinal" => Some(self.ordinal.to_string()),
            _ => None,
        }
    }
}

/// Inbound create/update body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

impl Validate for SampleRequest {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        trim_text(&mut self.name);
        trim_optional_text(&mut self.description);
        self.amount = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        self.translations
            .iter_mut()
            .try_for_each(Translation::normalize)
    }

    fn rules(&self, validator: &mut Validator) {
        validator.field(
            "name",
            FieldValue::Text(&self.name),
            &[Rule::Required, Rule::max(100)],
        );
        validator.field(
            "description",
            FieldValue::OptionalText(self.description.as_deref()),
            &[Rule::max(2000)],
        );
        validator.field(
            "amount",
            FieldValue::Number(self.amount),
            &[
                Rule::Min(Decimal::new(1, 2)),
                Rule::Max(Decimal::new(99_999_999_999, 2)),
            ],
        );
        validator.collection(
            "translations",
            &self.translations,
            &[
                Rule::min(1),
                Rule::max(100),
                Rule::Unique("language"),
                Rule::Unique("ordinal"),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{SampleRequest, Translation};
    use crate::error::SampleError;
    use crate::validation::validate;
    use rust_decimal::Decimal;

    fn translation(language: &str, ordinal: i16) -> Translation {
        Translation {
            language: language.to_string(),
            name: "Widget".to_string(),
            description: None,
            ordinal,
        }
    }

    fn request(translations: Vec<Translation>) -> SampleRequest {
        SampleRequest {
            name: "Widget".to_string(),
            description: Some("  ".to_string()),
            amount: Decimal::new(1000, 2),
            translations,
        }
    }

    #[test]
    fn request_decodes_from_camel_case_json() {
        let request: SampleRequest = serde_json::from_str(
            r#"{"name":"Widget","amount":"10.00","translations":[{"language":"en","name":"Widget","ordinal":1}]}"#,
        )
        .unwrap();
        assert_eq!(request.amount, Decimal::new(1000, 2));
        assert_eq!(request.translations[0], translation("en", 1));
    }

    #[test]
    fn normalize_trims_and_lowercases_language() {
        let mut item = translation(" EN ", 1);
        item.description = Some(" hello ".to_string());
        let request = validate(request(vec![item])).unwrap();

        assert_eq!(request.description, None);
        assert_eq!(request.translations[0].language, "en");
        assert_eq!(request.translations[0].description.as_deref(), Some("hello"));
    }

    #[test]
    fn duplicate_language_is_a_conflict_naming_language() {
        let err = validate(request(vec![translation("en", 1), translation("en", 2)])).unwrap_err();
        let SampleError::ValidationFailed { status, violations } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(status, 409);
        assert_eq!(violations[0].pointer, "/body/translations/language");
        assert_eq!(violations[0].code, "unique");
    }

    #[test]
    fn duplicate_ordinal_is_a_conflict_naming_ordinal() {
        let err = validate(request(vec![translation("en", 1), translation("fr", 1)])).unwrap_err();
        let SampleError::ValidationFailed { status, violations } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(status, 409);
        assert_eq!(violations[0].pointer, "/body/translations/ordinal");
    }

    #[test]
    fn amount_bounds_are_enforced() {
        let mut zero = request(vec![translation("en", 1)]);
        zero.amount = Decimal::ZERO;
        let SampleError::ValidationFailed { violations, .. } = validate(zero).unwrap_err() else {
            panic!("expected validation failure");
        };
        assert_eq!(violations[0].pointer, "/body/amount");
        assert_eq!(violations[0].code, "min");
    }

    #[test]
    fn missing_translations_fail_min() {
        let SampleError::ValidationFailed { status, violations } =
            validate(request(Vec::new())).unwrap_err()
        else {
            panic!("expected validation failure");
        };
        assert_eq!(status, 400);
        assert_eq!(violations[0].pointer, "/body/translations");
        assert_eq!(violations[0].code, "min");
    }
}
